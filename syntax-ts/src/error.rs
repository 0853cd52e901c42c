use thiserror::Error;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyntaxError {
  #[error("failed to load {dialect} grammar: {message}")]
  Language {
    dialect: &'static str,
    message: String,
  },
  #[error("parser produced no tree")]
  Cancelled,
  #[error("source is too large to index ({len} bytes)")]
  TooLarge { len: usize },
}
