use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{
    AgentKind, FinishReason, InterruptOption, MessageRole, OriginalInput, ToolCallChunk,
};

/// Message-bearing event payload shared by the chunked message events.
///
/// Every field except `id` is optional: the backend omits empty content and
/// only attaches finish_reason/tool data on the frames that carry them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl MessagePayload {
    pub fn chunk(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            thread_id: None,
            id: id.into(),
            agent: None,
            role: None,
            content: Some(content.into()),
            reasoning_content: None,
            finish_reason: None,
            tool_calls: Vec::new(),
            tool_call_chunks: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_finish(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }
}

/// Discriminated union of every event the research backend streams.
///
/// The tag mirrors the SSE `event:` field name; the frame decoder injects it
/// into the data payload before deserializing, so the wire shape and this
/// enum stay in one-to-one correspondence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// First event of a new session: announces the public url-param and the
    /// durable thread id behind it
    Navigation {
        url_param: String,
        thread_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        workspace_url: Option<String>,
    },

    /// Execution metadata, informational only
    Metadata {
        #[serde(skip_serializing_if = "Option::is_none")]
        execution_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        config_used: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        model_info: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_duration: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_time: Option<String>,
    },

    /// Pipeline progress, UI-only
    Progress {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        current_step: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        progress_percentage: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_message: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        steps_completed: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        steps_remaining: Vec<String>,
    },

    /// Raw message tokens
    MessageChunk(MessagePayload),

    /// Assembled tool calls on an assistant message
    ToolCalls(MessagePayload),

    /// Incremental tool-call argument fragments
    ToolCallChunks(MessagePayload),

    /// Result of an executed tool call
    ToolCallResult(MessagePayload),

    /// Structured plan emitted by the planner
    PlanGenerated {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent: Option<AgentKind>,
        plan: Value,
    },

    /// Search results gathered during research activity
    SearchResults {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        #[serde(default)]
        results: Vec<Value>,
    },

    /// Free-form output from a named agent
    AgentOutput {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent: Option<AgentKind>,
        content: String,
    },

    /// A pipeline node began executing
    NodeStart {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        node: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        execution_id: Option<String>,
    },

    /// A pipeline node finished
    NodeComplete {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        node: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        execution_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },

    /// Explicit artifact announcement (plan, report, podcast payload)
    #[serde(rename = "artifact")]
    ArtifactHint {
        artifact_id: String,
        #[serde(rename = "type")]
        artifact_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default)]
        metadata: Value,
    },

    /// The backend paused and requires the user to pick an option
    Interrupt {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<FinishReason>,
        #[serde(default)]
        options: Vec<InterruptOption>,
    },

    /// Restore-original-input flow: the thread resets so the user can edit
    /// and resubmit their question
    Reask {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        original_input: OriginalInput,
    },

    /// Terminal event for an execution
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        execution_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        final_status: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        artifacts_generated: Vec<String>,
    },

    /// Stream-level failure; also synthesized client-side on transport loss
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_code: Option<String>,
        error_message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        suggestions: Vec<String>,
    },
}

impl StreamEvent {
    /// Wire name of the event (the SSE `event:` field)
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Navigation { .. } => "navigation",
            StreamEvent::Metadata { .. } => "metadata",
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::MessageChunk(_) => "message_chunk",
            StreamEvent::ToolCalls(_) => "tool_calls",
            StreamEvent::ToolCallChunks(_) => "tool_call_chunks",
            StreamEvent::ToolCallResult(_) => "tool_call_result",
            StreamEvent::PlanGenerated { .. } => "plan_generated",
            StreamEvent::SearchResults { .. } => "search_results",
            StreamEvent::AgentOutput { .. } => "agent_output",
            StreamEvent::NodeStart { .. } => "node_start",
            StreamEvent::NodeComplete { .. } => "node_complete",
            StreamEvent::ArtifactHint { .. } => "artifact",
            StreamEvent::Interrupt { .. } => "interrupt",
            StreamEvent::Reask { .. } => "reask",
            StreamEvent::Complete { .. } => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Thread the event is scoped to, when it carries one
    pub fn thread_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Navigation { thread_id, .. } => Some(thread_id.as_str()),
            StreamEvent::Metadata { thread_id, .. }
            | StreamEvent::Progress { thread_id, .. }
            | StreamEvent::PlanGenerated { thread_id, .. }
            | StreamEvent::SearchResults { thread_id, .. }
            | StreamEvent::AgentOutput { thread_id, .. }
            | StreamEvent::NodeStart { thread_id, .. }
            | StreamEvent::NodeComplete { thread_id, .. }
            | StreamEvent::ArtifactHint { thread_id, .. }
            | StreamEvent::Interrupt { thread_id, .. }
            | StreamEvent::Reask { thread_id, .. }
            | StreamEvent::Complete { thread_id, .. }
            | StreamEvent::Error { thread_id, .. } => thread_id.as_deref(),
            StreamEvent::MessageChunk(p)
            | StreamEvent::ToolCalls(p)
            | StreamEvent::ToolCallChunks(p)
            | StreamEvent::ToolCallResult(p) => p.thread_id.as_deref(),
        }
    }

    /// Synthetic transport-failure event, yielded in place of a stream error
    pub fn transport_error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            thread_id: None,
            error_code: Some("transport".to_string()),
            error_message: message.into(),
            suggestions: Vec::new(),
        }
    }
}
