pub mod artifact;
pub mod event;
pub mod message;
pub mod settings;

pub use artifact::{mime, Artifact, ArtifactKind, ArtifactRecord};
pub use event::{MessagePayload, StreamEvent};
pub use message::{
    AgentKind, FinishReason, InterruptOption, Message, MessageRole, MessageSource, OriginalInput,
    Resource, ToolCallChunk, ToolCallSnapshot,
};
pub use settings::{ModelConfig, OutputConfig, ReportStyle, ResearchConfig, ResearchSettings};
