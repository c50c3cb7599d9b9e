//! `HOST:PORT` address parsing.

/// Parses a `HOST:PORT` specification.
///
/// A bare `:PORT` means `127.0.0.1:PORT`. The port is split on the last
/// colon so bracketless IPv6 hosts still parse.
pub fn parse_host_port(spec: &str) -> Result<(String, u16), AddrError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(AddrError::Empty);
    }
    let (host, port) = if let Some(port) = spec.strip_prefix(':') {
        ("127.0.0.1", port)
    } else {
        spec.rsplit_once(':')
            .ok_or_else(|| AddrError::MissingPort(spec.to_owned()))?
    };
    let port = port
        .parse::<u16>()
        .map_err(|_| AddrError::InvalidPort(port.to_owned()))?;
    Ok((host.to_owned(), port))
}

/// Address parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrError {
    /// The specification was empty.
    Empty,
    /// No `:PORT` part was present.
    MissingPort(String),
    /// The port was not a valid 16-bit integer.
    InvalidPort(String),
}

impl std::fmt::Display for AddrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddrError::Empty => write!(f, "empty address, expected HOST:PORT or :PORT"),
            AddrError::MissingPort(spec) => {
                write!(f, "expected HOST:PORT or :PORT, got {spec:?}")
            }
            AddrError::InvalidPort(port) => write!(f, "invalid port: {port:?}"),
        }
    }
}

impl std::error::Error for AddrError {}
