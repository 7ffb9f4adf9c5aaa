use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Question exceeds the {max} character limit")]
    QuestionTooLong { max: usize },

    #[error("Backend rejected the request with status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error(transparent)]
    Stream(#[from] weft_stream::StreamError),

    #[error(transparent)]
    Store(#[from] weft_store::StoreError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
