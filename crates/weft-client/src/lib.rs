pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod records;

pub use client::{
    AskResearchResponse, AskType, FollowupInfo, SendOptions, StreamHandle, WorkspaceClient,
    WorkspaceSnapshot,
};
pub use config::ClientConfig;
pub use dispatch::{run_dispatcher, StreamFault};
pub use error::ClientError;
pub use records::ArtifactRecordSource;
