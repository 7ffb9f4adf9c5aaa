//! # Weft
//!
//! Client-side state synchronization core for a deep-research workspace:
//! ingest a server-sent-event stream of heterogeneous research-pipeline
//! events and project it into a consistent, render-friendly view model
//! spanning multiple threads.
//!
//! ## Overview
//!
//! Weft gives a chat/workspace UI everything between the wire and the
//! render loop:
//!
//! - **Typed event streaming** over SSE, cancelable and loss-tolerant
//! - **A normalized store** of messages with append-only streaming
//!   accumulation across any number of concurrently streaming messages
//! - **Research aggregates** per thread: plans, reports, podcasts,
//!   activity, interrupts
//! - **Artifact projection**: a deterministic, memoized derivation of
//!   display-ready artifacts
//! - **An action API** for asking questions, sending feedback, and
//!   aborting streams
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weft::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), weft::ClientError> {
//!     let store = WorkspaceStore::shared();
//!     let (client, mut faults) = WorkspaceClient::new(
//!         ClientConfig::new("http://localhost:8000"),
//!         store.clone(),
//!     );
//!
//!     let ask = client
//!         .ask_research("量子计算如何影响密码学", AskType::Initial, None)
//!         .await?;
//!
//!     let handle = client
//!         .send_message(&ask.thread_id, "量子计算如何影响密码学", SendOptions::default())
//!         .await?;
//!     handle.wait().await;
//!
//!     let store = store.read().unwrap();
//!     for artifact in store.artifacts(&ask.thread_id).iter() {
//!         println!("{}: {}", artifact.mime, artifact.summary);
//!     }
//!     while let Ok(fault) = faults.try_recv() {
//!         eprintln!("stream fault: {}", fault.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Weft is organized into focused crates:
//!
//! - **`weft-types`**: data model and the SSE event taxonomy
//! - **`weft-stream`**: SSE framing, typed decode, cancelable streams
//! - **`weft-store`**: normalized message/research store and projections
//! - **`weft-client`**: action API and the stream dispatcher
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use weft_types::{
    mime, AgentKind, Artifact, ArtifactKind, ArtifactRecord, FinishReason, InterruptOption,
    Message, MessagePayload, MessageRole, MessageSource, ModelConfig, OriginalInput, OutputConfig,
    ReportStyle, ResearchConfig, ResearchSettings, Resource, StreamEvent, ToolCallChunk,
    ToolCallSnapshot,
};

pub use weft_stream::{connect, event_stream, EventStream, FrameBuffer, SseFrame, StreamError};

pub use weft_store::{
    merge_records, project_thread, IdentityMap, MessagePatch, MessageStore, ProgressSnapshot,
    SharedStore, StoreError, ThreadState, UiState, WorkspaceStore,
};

pub use weft_client::{
    ArtifactRecordSource, AskResearchResponse, AskType, ClientConfig, ClientError, FollowupInfo,
    SendOptions, StreamFault, StreamHandle, WorkspaceClient, WorkspaceSnapshot,
};
