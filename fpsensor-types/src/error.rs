pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument is outside the range the sensor accepts
    #[error("Validation error: {0}")]
    Validation(String),

    /// A result payload does not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
