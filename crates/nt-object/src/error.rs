#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid reminder expression '{0}'")]
    InvalidReminder(String),

    #[error("attribute '{name}': expected {expected}, got {actual}")]
    AttributeType {
        name: String,
        expected: &'static str,
        actual: String,
    },

    #[error("unknown object kind '{0}'")]
    UnknownKind(String),

    #[error(transparent)]
    Markdown(#[from] nt_markdown::MarkdownError),

    #[error(transparent)]
    Path(#[from] nt_utils::UtilError),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_yaml::Error),
}
