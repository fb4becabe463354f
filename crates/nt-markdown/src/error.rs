use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MarkdownError {
    #[error("malformed front matter: {0}")]
    FrontMatter(String),

    #[error("unterminated front matter block")]
    UnterminatedFrontMatter,

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
