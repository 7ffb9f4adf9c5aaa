use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected stream request with status {code}")]
    Status { code: u16 },
}

pub type Result<T> = std::result::Result<T, StreamError>;
