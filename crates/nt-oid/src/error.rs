#[derive(Debug, thiserror::Error)]
pub enum OidError {
    #[error("invalid oid length: expected 40 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid oid: non-hexadecimal character {0:?}")]
    InvalidHex(char),

    #[error("oid sequence exhausted after {0} values")]
    SequenceExhausted(usize),
}
