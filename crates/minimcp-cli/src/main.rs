//! minimcp CLI - serve the context file over MCP, or talk to a running server.
//!
//! Commands:
//! - `serve` - Run the TCP server
//! - `read` - Print the full context file from a running server
//! - `search` - Search the context file on a running server
//! - `repl` - Interactive shell over one connection

#![forbid(unsafe_code)]

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::error;
use serde_json::{Map, Value};

use minimcp_client::{Client, ClientConfig};
use minimcp_protocol::CallToolResult;
use minimcp_server::{Corpus, ReadFileTool, SearchFileTool, Server};
use minimcp_transport::TcpTransport;

/// Default listen/connect target.
const DEFAULT_ADDR: &str = "127.0.0.1:8765";

/// Minimal MCP server and client over TCP.
#[derive(Parser)]
#[command(name = "minimcp")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by all client commands.
#[derive(Args)]
struct ConnectOpts {
    /// Server address to connect to.
    #[arg(
        long,
        value_name = "HOST:PORT",
        default_value = DEFAULT_ADDR,
        env = "MINIMCP_CONNECT"
    )]
    connect: String,

    /// Give up waiting for a response after this many seconds.
    #[arg(long, value_name = "SECONDS", env = "MINIMCP_TIMEOUT")]
    timeout_secs: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server.
    Serve {
        /// Address to listen on.
        #[arg(
            long,
            value_name = "HOST:PORT",
            default_value = DEFAULT_ADDR,
            env = "MINIMCP_BIND"
        )]
        bind: String,

        /// Context file served by the tools.
        #[arg(
            long,
            value_name = "PATH",
            default_value = "context.txt",
            env = "MINIMCP_SOURCE"
        )]
        source: PathBuf,
    },

    /// Print the full context file from a running server.
    Read {
        #[command(flatten)]
        connect: ConnectOpts,

        /// Optional path override sent to the server.
        path: Option<String>,
    },

    /// Search the context file on a running server.
    Search {
        #[command(flatten)]
        connect: ConnectOpts,

        /// Words to search for.
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Interactive shell: read, search, tools, help, quit.
    Repl {
        #[command(flatten)]
        connect: ConnectOpts,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve { bind, source } => serve(&bind, source),
        Commands::Read { connect, path } => read_once(&connect, path.as_deref()),
        Commands::Search { connect, words } => search_once(&connect, &words.join(" ")),
        Commands::Repl { connect } => repl(&connect),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn serve(bind: &str, source: PathBuf) -> Result<(), Box<dyn Error>> {
    let corpus = Arc::new(Corpus::new(source));
    let server = Server::builder("minimcp-server", env!("CARGO_PKG_VERSION"))
        .tool(ReadFileTool::new(Arc::clone(&corpus)))
        .tool(SearchFileTool::new(corpus))
        .build();
    server.run_tcp(bind)?;
    Ok(())
}

/// Connects and completes the initialize handshake.
fn connect(opts: &ConnectOpts) -> Result<Client<TcpTransport>, Box<dyn Error>> {
    let config = ClientConfig {
        timeout_seconds: opts.timeout_secs,
        ..ClientConfig::default()
    };
    let mut client = Client::connect(&opts.connect, config).map_err(|err| {
        format!(
            "failed to connect to {}: {err} (start one with: minimcp serve)",
            opts.connect
        )
    })?;
    client.initialize()?;
    Ok(client)
}

fn read_arguments(path: Option<&str>) -> Map<String, Value> {
    let mut arguments = Map::new();
    if let Some(path) = path {
        arguments.insert("path".to_owned(), Value::String(path.to_owned()));
    }
    arguments
}

fn search_arguments(words: &str) -> Map<String, Value> {
    let mut arguments = Map::new();
    arguments.insert("words".to_owned(), Value::String(words.to_owned()));
    arguments
}

/// Prints tool output text blocks to stdout.
fn print_result(result: &CallToolResult) {
    println!("{}", result.text());
}

fn read_once(opts: &ConnectOpts, path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut client = connect(opts)?;
    let outcome = client.call_tool("read_file", read_arguments(path));
    client.close();
    print_result(&outcome?);
    Ok(())
}

fn search_once(opts: &ConnectOpts, words: &str) -> Result<(), Box<dyn Error>> {
    let mut client = connect(opts)?;
    let outcome = client.call_tool("search_file", search_arguments(words));
    client.close();
    print_result(&outcome?);
    Ok(())
}

const REPL_HELP: &str = "Commands: read [path] | search <words> | tools | help | quit";

fn repl(opts: &ConnectOpts) -> Result<(), Box<dyn Error>> {
    let mut client = connect(opts)?;
    let tools = client.list_tools()?;
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    eprintln!("Connected. Tools: {}", names.join(", "));
    eprintln!("{REPL_HELP}");

    let stdin = io::stdin();
    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        // Errors print one line and the loop continues.
        let outcome = match command.to_lowercase().as_str() {
            "quit" | "exit" => break,
            "help" | "h" | "?" => {
                eprintln!("{REPL_HELP}");
                continue;
            }
            "tools" => client.list_tools().map(|tools| {
                let names: Vec<String> = tools.into_iter().map(|t| t.name).collect();
                eprintln!("Tools: {}", names.join(", "));
            }),
            "read" => {
                let path = if rest.is_empty() { None } else { Some(rest) };
                client
                    .call_tool("read_file", read_arguments(path))
                    .map(|result| print_result(&result))
            }
            "search" => {
                if rest.is_empty() {
                    eprintln!("Usage: search <words>");
                    continue;
                }
                client
                    .call_tool("search_file", search_arguments(rest))
                    .map(|result| print_result(&result))
            }
            other => {
                eprintln!("Unknown command: {other}. Type 'help' for options.");
                continue;
            }
        };
        if let Err(err) = outcome {
            eprintln!("error: {err}");
        }
    }

    client.close();
    Ok(())
}
