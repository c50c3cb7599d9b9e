//! The built-in corpus tools.

use std::path::Path;
use std::sync::Arc;

use minimcp_core::{RpcError, RpcResult};
use minimcp_protocol::{Content, Tool};
use serde_json::{Map, Value, json};

use crate::corpus::Corpus;
use crate::handler::{ToolHandler, optional_str, required_str};

/// `read_file`: returns the full text of the corpus.
pub struct ReadFileTool {
    corpus: Arc<Corpus>,
}

impl ReadFileTool {
    /// Creates the tool over the given corpus.
    #[must_use]
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }
}

impl ToolHandler for ReadFileTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "read_file".to_owned(),
            description: "Read the configured context file (or an optional path).".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"}
                }
            }),
        }
    }

    fn call(&self, arguments: &Map<String, Value>) -> RpcResult<Vec<Content>> {
        let path = optional_str(arguments, "path")?.map(Path::new);
        let text = self.corpus.full_text(path)?;
        Ok(vec![Content::text(text)])
    }
}

/// `search_file`: returns lines of the corpus matching a query.
pub struct SearchFileTool {
    corpus: Arc<Corpus>,
}

impl SearchFileTool {
    /// Creates the tool over the given corpus.
    #[must_use]
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }
}

impl ToolHandler for SearchFileTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "search_file".to_owned(),
            description: "Search for words in the context file and return matching lines."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "words": {"type": "string", "description": "Search string"},
                    "path": {"type": "string"}
                },
                "required": ["words"]
            }),
        }
    }

    fn call(&self, arguments: &Map<String, Value>) -> RpcResult<Vec<Content>> {
        let query = required_str(arguments, "words")?.trim().to_owned();
        if query.is_empty() {
            return Err(RpcError::invalid_params("search query must not be empty"));
        }
        let path = optional_str(arguments, "path")?.map(Path::new);
        let matches = self.corpus.search(&query, path)?;
        Ok(vec![Content::text(render_matches(&query, &matches))])
    }
}

/// Renders search results as one text block, one `line: text` row per match.
fn render_matches(query: &str, matches: &[(usize, String)]) -> String {
    if matches.is_empty() {
        return format!("No matches for: {query}");
    }
    let mut out = format!("Matches ({}) for: {query}", matches.len());
    for (line_number, line) in matches {
        out.push_str(&format!("\n{line_number}: {line}"));
    }
    out
}
