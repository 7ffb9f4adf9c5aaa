use std::sync::Arc;

use chrono::Utc;
use weft_store::WorkspaceStore;
use weft_types::{AgentKind, ArtifactKind, ArtifactRecord, MessagePayload, StreamEvent};

fn chunk(thread: &str, id: &str, agent: AgentKind, content: &str) -> StreamEvent {
    StreamEvent::MessageChunk(
        MessagePayload::chunk(id, content)
            .with_thread(thread)
            .with_agent(agent),
    )
}

fn long_text(prefix: &str) -> String {
    format!("{prefix} {}", "content ".repeat(30))
}

// Scenario C: reporter output projects, researcher output does not
#[test]
fn test_reporter_included_researcher_excluded() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk("t1", "m3", AgentKind::Reporter, &long_text("# Report\nFindings.")));
    store.apply_event(&chunk("t1", "m4", AgentKind::Researcher, &long_text("raw notes")));

    let artifacts = store.artifacts("t1");
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].message_id, "m3");
    assert_eq!(artifacts[0].kind, ArtifactKind::Result);
    assert_eq!(artifacts[0].mime, "text/markdown+report");
}

// ...unless the researcher message carries explicit artifact metadata
#[test]
fn test_explicit_artifact_flag_overrides_agent_exclusion() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk("t1", "m4", AgentKind::Researcher, &long_text("notable notes")));
    store.apply_event(&StreamEvent::ArtifactHint {
        artifact_id: "m4".to_string(),
        artifact_type: "research_notes".to_string(),
        thread_id: Some("t1".to_string()),
        title: None,
        content: None,
        metadata: serde_json::json!({}),
    });

    let artifacts = store.artifacts("t1");
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].message_id, "m4");
    assert_eq!(artifacts[0].mime, "text/x-research-notes");
}

// Property 4: two projections of unchanged state are identical AND
// pointer-equal (referential stability for render dependencies)
#[test]
fn test_projection_deterministic_and_referentially_stable() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk("t1", "plan1", AgentKind::Planner, &long_text("# Plan\n1. do")));
    store.apply_event(&chunk("t1", "rep1", AgentKind::Reporter, &long_text("# Report\ndone.")));

    let first = store.artifacts("t1");
    let second = store.artifacts("t1");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first, second);

    // A mutation invalidates the memo; the recomputed list is equal in
    // content for equal state but is a fresh allocation
    store.apply_event(&chunk("t2", "other", AgentKind::Reporter, &long_text("unrelated")));
    let third = store.artifacts("t1");
    assert!(!Arc::ptr_eq(&second, &third));
    assert_eq!(*second, *third);
}

#[test]
fn test_streaming_message_excluded_until_substantial() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk("t1", "rep1", AgentKind::Reporter, "short start"));
    assert!(store.artifacts("t1").is_empty());

    // Push it past the substantial threshold while still streaming
    store.apply_event(&chunk("t1", "rep1", AgentKind::Reporter, &"x".repeat(100)));
    let artifacts = store.artifacts("t1");
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].streaming);
}

#[test]
fn test_finalized_short_message_included() {
    let mut store = WorkspaceStore::new();
    let mut payload = MessagePayload::chunk("rep1", "Done.")
        .with_thread("t1")
        .with_agent(AgentKind::Reporter);
    payload.finish_reason = Some(weft_types::FinishReason::Stop);
    store.apply_event(&StreamEvent::MessageChunk(payload));

    let artifacts = store.artifacts("t1");
    assert_eq!(artifacts.len(), 1);
    assert!(!artifacts[0].streaming);
}

#[test]
fn test_empty_and_coordinator_messages_excluded() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk("t1", "m1", AgentKind::Coordinator, &long_text("chatty greeting")));
    store.apply_event(&StreamEvent::MessageChunk(
        MessagePayload::chunk("m2", "").with_thread("t1").with_agent(AgentKind::Reporter),
    ));

    assert!(store.artifacts("t1").is_empty());
}

#[test]
fn test_artifact_ordering_follows_message_insertion() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk("t1", "plan1", AgentKind::Planner, &long_text("# Plan\n1. a")));
    store.apply_event(&chunk("t1", "code1", AgentKind::Coder, &long_text("fn main() {}")));
    store.apply_event(&chunk("t1", "rep1", AgentKind::Reporter, &long_text("# Report\nend.")));

    let artifacts = store.artifacts("t1");
    let ids: Vec<&str> = artifacts.iter().map(|a| a.message_id.as_str()).collect();
    assert_eq!(ids, vec!["plan1", "code1", "rep1"]);
    assert_eq!(artifacts[0].id, "artifact-plan1");
    assert_eq!(artifacts[1].kind, ArtifactKind::Process);
    assert_eq!(artifacts[2].kind, ArtifactKind::Result);
}

#[test]
fn test_summary_truncated_at_sentence_boundary() {
    let mut store = WorkspaceStore::new();
    let body = format!("Quantum computing changes cryptography. {}", "More detail. ".repeat(40));
    store.apply_event(&chunk("t1", "rep1", AgentKind::Reporter, &body));

    let artifacts = store.artifacts("t1");
    assert!(artifacts[0].summary.chars().count() <= 100);
    assert!(artifacts[0].summary.ends_with('.') || artifacts[0].summary.ends_with('…'));
}

#[test]
fn test_title_extracted_from_heading() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk(
        "t1",
        "rep1",
        AgentKind::Reporter,
        &format!("# 量子计算报告\n\n{}", long_text("body")),
    ));

    let artifacts = store.artifacts("t1");
    assert_eq!(artifacts[0].title.as_deref(), Some("量子计算报告"));
}

#[test]
fn test_merge_records_adds_only_unknown_ids() {
    let mut store = WorkspaceStore::new();
    store.apply_event(&chunk("t1", "rep1", AgentKind::Reporter, &long_text("# Report\nend.")));

    let records = vec![
        // Same id as the SSE-derived artifact: stream entry wins
        ArtifactRecord {
            id: "artifact-rep1".to_string(),
            trace_id: "t1".to_string(),
            node_name: "reporter".to_string(),
            record_type: ArtifactKind::Result,
            mime: "text/markdown+report".to_string(),
            summary: "stale summary from the table".to_string(),
            payload_url: None,
            created_at: Utc::now(),
            user_id: None,
            metadata: serde_json::json!({}),
        },
        // New id: appended after the projected entries
        ArtifactRecord {
            id: "artifact-pod1".to_string(),
            trace_id: "t1".to_string(),
            node_name: "podcast_generator".to_string(),
            record_type: ArtifactKind::Result,
            mime: "audio/mpeg+podcast".to_string(),
            summary: "5 minute audio digest".to_string(),
            payload_url: Some("https://cdn.example.com/pod1.mp3".to_string()),
            created_at: Utc::now(),
            user_id: None,
            metadata: serde_json::json!({}),
        },
    ];

    let merged = store.artifacts_with_records("t1", &records);
    assert_eq!(merged.len(), 2);
    assert_ne!(merged[0].summary, "stale summary from the table");
    assert_eq!(merged[1].id, "artifact-pod1");
    assert_eq!(merged[1].message_id, "pod1");
}

#[test]
fn test_untagged_plan_marker_fallback() {
    let mut store = WorkspaceStore::new();
    // No agent tag at all; classification falls back to the documented
    // plan-marker heuristic
    store.apply_event(&StreamEvent::MessageChunk(
        MessagePayload::chunk("p1", &format!("# Research Plan\n\n1. {}", "step ".repeat(30)))
            .with_thread("t1"),
    ));

    let artifacts = store.artifacts("t1");
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].mime, "text/markdown+plan");
}
