use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out after {millis}ms: {operation}")]
    Timeout { operation: String, millis: u64 },

    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("Unexpected {field} text '{text}': {message}")]
    Format {
        field: &'static str,
        text: String,
        message: String,
    },

    #[error("Unknown category code: {0}")]
    InvalidCategory(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by callers deciding whether to skip, retry or halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fetch, navigation or browser session failure
    Transport,
    /// The page did not have the expected shape
    Structure,
    /// Bad input or configuration
    Usage,
}

impl CrawlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrawlerError::Http(_) | CrawlerError::Transport(_) | CrawlerError::Timeout { .. } => {
                ErrorKind::Transport
            }
            CrawlerError::MissingElement(_) | CrawlerError::Format { .. } | CrawlerError::Json(_) => {
                ErrorKind::Structure
            }
            CrawlerError::InvalidCategory(_)
            | CrawlerError::Toml(_)
            | CrawlerError::Io(_)
            | CrawlerError::Config(_) => ErrorKind::Usage,
        }
    }

    /// Whether repeating the operation could succeed.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub fn missing(selector: &str) -> Self {
        CrawlerError::MissingElement(selector.to_string())
    }

    pub fn format(field: &'static str, text: &str, message: impl Into<String>) -> Self {
        CrawlerError::Format {
            field,
            text: text.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlerError>;
