#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("query syntax error: {0}")]
    QuerySyntax(String),

    #[error(transparent)]
    Pack(#[from] nt_pack::PackError),

    #[error(transparent)]
    Object(#[from] nt_object::ObjectError),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
