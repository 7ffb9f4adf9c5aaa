//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use weft::prelude::*;
//! ```

pub use crate::{
    AgentKind, Artifact, ArtifactKind, ArtifactRecord, AskType, ClientConfig, FinishReason,
    InterruptOption, Message, MessageRole, Resource, SendOptions, SharedStore, StreamEvent,
    StreamHandle, WorkspaceClient, WorkspaceStore,
};
