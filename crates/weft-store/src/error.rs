use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Thread not found: {0}")]
    UnknownThread(String),

    #[error("Research unit {research_id} not found in thread {thread_id}")]
    UnknownResearch {
        thread_id: String,
        research_id: String,
    },

    #[error("Message not found: {0}")]
    UnknownMessage(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
