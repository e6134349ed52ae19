use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Stream(#[from] std::io::Error),
    #[error("this file type is not supported")]
    UnsupportedFormat,
    #[error("reached max bytes limit of {0}")]
    QuotaExceeded(u64),
    #[error("{0}")]
    InvalidData(&'static str),
}
