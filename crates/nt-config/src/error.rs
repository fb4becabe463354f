#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {file}: {reason}")]
    Invalid { file: String, reason: String },

    #[error("unknown lint rule \"{0}\"")]
    UnknownRule(String),

    #[error("duplicate attribute '{attribute}' in schema '{schema}'")]
    DuplicateAttribute { schema: String, attribute: String },

    #[error("invalid pattern for attribute '{attribute}': {reason}")]
    InvalidPattern { attribute: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
