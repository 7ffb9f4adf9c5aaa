use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::AgentKind;

/// Whether an artifact is an intermediate working output or a final
/// deliverable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Process,
    Result,
}

/// Refined content-type tags used to pick a renderer
pub mod mime {
    pub const PLAN: &str = "text/markdown+plan";
    pub const REPORT: &str = "text/markdown+report";
    pub const RESEARCH_NOTES: &str = "text/x-research-notes";
    pub const CODE: &str = "text/x-code";
    pub const PODCAST: &str = "audio/mpeg+podcast";
}

/// Display-ready projection of a message.
///
/// `id` is a deterministic function of the source message id, so the list
/// stays diffable across recomputations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub message_id: String,
    pub thread_id: String,
    pub kind: ArtifactKind,
    pub mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Excerpt for list views, at most 100 chars, cut at a sentence boundary
    pub summary: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    /// True while the source message is still accumulating content
    pub streaming: bool,
}

impl Artifact {
    /// Deterministic artifact id for a source message
    pub fn id_for_message(message_id: &str) -> String {
        format!("artifact-{message_id}")
    }
}

/// Row from the external artifact-records table.
///
/// An eventually-consistent secondary source, merged by id with the
/// SSE-derived projection; never authoritative over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: String,
    pub trace_id: String,
    pub node_name: String,
    #[serde(rename = "type")]
    pub record_type: ArtifactKind,
    pub mime: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_id_deterministic() {
        assert_eq!(Artifact::id_for_message("m3"), Artifact::id_for_message("m3"));
        assert_ne!(Artifact::id_for_message("m3"), Artifact::id_for_message("m4"));
    }

    #[test]
    fn test_artifact_kind_wire_format() {
        assert_eq!(serde_json::to_string(&ArtifactKind::Result).unwrap(), "\"result\"");
    }
}
