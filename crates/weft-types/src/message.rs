use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

/// Backend agent that produced an assistant message.
///
/// Absence of an agent tag means a plain conversational turn. `Other` absorbs
/// agent names this client does not know yet, so new backend agents never
/// break decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Coordinator,
    Planner,
    Researcher,
    Coder,
    Reporter,
    PodcastGenerator,
    #[serde(other)]
    Other,
}

impl AgentKind {
    /// Agents whose output is projected into the artifact panel.
    ///
    /// Researcher output is intermediate activity, not an artifact, unless a
    /// message carries explicit artifact metadata.
    pub fn is_artifact_producing(&self) -> bool {
        matches!(
            self,
            AgentKind::Planner | AgentKind::Coder | AgentKind::Reporter | AgentKind::PodcastGenerator
        )
    }

    /// Agents whose messages belong inside a research unit (plan, activity,
    /// report, podcast) rather than the plain conversation flow
    pub fn is_research_agent(&self) -> bool {
        matches!(
            self,
            AgentKind::Planner
                | AgentKind::Researcher
                | AgentKind::Coder
                | AgentKind::Reporter
                | AgentKind::PodcastGenerator
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Coordinator => "coordinator",
            AgentKind::Planner => "planner",
            AgentKind::Researcher => "researcher",
            AgentKind::Coder => "coder",
            AgentKind::Reporter => "reporter",
            AgentKind::PodcastGenerator => "podcast_generator",
            AgentKind::Other => "other",
        }
    }
}

/// Terminal state of a message stream.
///
/// `Cancelled` is applied client-side when a stream is aborted mid-message;
/// it never arrives on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Interrupt,
    ToolCalls,
    Reask,
    Cancelled,
}

/// How a user message originated. Affects display labeling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    Input,
    Button,
    System,
}

/// One choice offered by an interrupt (e.g. accept/edit/reject a plan)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptOption {
    pub text: String,
    pub value: String,
}

/// An attachment referenced by a question (RAG resource, uploaded file, URL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub uri: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Snapshot of a raw submission, kept so a re-ask can restore the original
/// query for editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalInput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Incremental fragment of a tool call, keyed by index within the message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// A tool call assembled from its chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallSnapshot {
    pub id: String,
    pub name: String,
    /// Accumulated JSON argument string (may be partial while streaming)
    pub arguments: String,
}

/// The atomic unit of conversation/output.
///
/// Content is append-only while `is_streaming` is true; `finish_reason` is
/// set exactly once, on the terminal event for the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    pub content: String,
    /// Raw chunk sequence, recoverable for debugging/replay
    #[serde(default)]
    pub content_chunks: Vec<String>,
    pub is_streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallSnapshot>,
    #[serde(default)]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Choices offered to the user when finish_reason = interrupt
    #[serde(default)]
    pub options: Vec<InterruptOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MessageSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_input: Option<OriginalInput>,
}

impl Message {
    /// New streaming message with empty content
    pub fn streaming(id: impl Into<String>, thread_id: impl Into<String>, role: MessageRole) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            role,
            agent: None,
            content: String::new(),
            content_chunks: Vec::new(),
            is_streaming: true,
            reasoning_content: None,
            tool_calls: Vec::new(),
            tool_call_chunks: Vec::new(),
            finish_reason: None,
            options: Vec::new(),
            source: None,
            original_input: None,
        }
    }

    /// Completed user message
    pub fn user(id: impl Into<String>, thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::streaming(id, thread_id, MessageRole::User);
        msg.content = content.into();
        msg.is_streaming = false;
        msg.finish_reason = Some(FinishReason::Stop);
        msg.source = Some(MessageSource::Input);
        msg
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_streaming && self.finish_reason.is_some()
    }

    pub fn was_cancelled(&self) -> bool {
        self.finish_reason == Some(FinishReason::Cancelled)
    }
}
