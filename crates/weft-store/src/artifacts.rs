use std::collections::HashSet;

use weft_types::{mime, AgentKind, Artifact, ArtifactKind, ArtifactRecord, Message, MessageRole, MessageSource};

use crate::messages::MessageStore;
use crate::threads::ThreadState;

/// A streaming message becomes artifact-worthy once it has accumulated this
/// many characters, so partial reports appear when substantial rather than
/// on the first byte
pub const SUBSTANTIAL_CONTENT_LEN: usize = 80;

/// Maximum summary length for list views
const SUMMARY_MAX_CHARS: usize = 100;

/// Classify a message into an artifact kind and mime tag.
///
/// The structured `agent` tag is authoritative. The plan-marker sniff below
/// is a best-effort fallback for untagged messages only; it goes away once
/// the backend tags every frame.
fn classify(message: &Message, explicitly_flagged: bool) -> Option<(ArtifactKind, &'static str)> {
    match message.agent {
        Some(AgentKind::Planner) => Some((ArtifactKind::Process, mime::PLAN)),
        Some(AgentKind::Coder) => Some((ArtifactKind::Process, mime::CODE)),
        Some(AgentKind::Reporter) => Some((ArtifactKind::Result, mime::REPORT)),
        Some(AgentKind::PodcastGenerator) => Some((ArtifactKind::Result, mime::PODCAST)),
        Some(AgentKind::Researcher) if explicitly_flagged => {
            Some((ArtifactKind::Process, mime::RESEARCH_NOTES))
        }
        None if explicitly_flagged => Some((ArtifactKind::Process, mime::RESEARCH_NOTES)),
        None if looks_like_plan(&message.content) => Some((ArtifactKind::Process, mime::PLAN)),
        _ => None,
    }
}

/// Documented heuristic, not a guarantee: untagged plan messages from older
/// backends start with a markdown heading followed by numbered steps
fn looks_like_plan(content: &str) -> bool {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(first) = lines.next() else {
        return false;
    };
    first.trim_start().starts_with('#')
        && lines.any(|l| {
            let t = l.trim_start();
            t.starts_with("1.") || t.starts_with("- ")
        })
}

/// The exclusion rule: only substantial, non-transient output from
/// artifact-producing agents (or explicitly flagged messages) is projected
fn is_artifact_worthy(message: &Message, explicitly_flagged: bool) -> bool {
    if message.content.is_empty() {
        return false;
    }
    if message.role != MessageRole::Assistant {
        return false;
    }
    if message.source == Some(MessageSource::System) {
        return false;
    }
    if message.is_streaming && message.content.chars().count() < SUBSTANTIAL_CONTENT_LEN {
        return false;
    }
    let producing = message
        .agent
        .map(|a| a.is_artifact_producing())
        .unwrap_or(false);
    producing || explicitly_flagged || classify(message, explicitly_flagged).is_some()
}

/// Derive an excerpt of at most 100 chars, preferring to cut at a sentence
/// boundary
pub fn summarize(content: &str) -> String {
    let head: String = content.chars().take(SUMMARY_MAX_CHARS).collect();
    if content.chars().count() <= SUMMARY_MAX_CHARS {
        return head;
    }

    // Look for the last sentence terminator in the window; fall back to a
    // hard cut with an ellipsis
    let terminators = ['.', '!', '?', '。', '！', '？'];
    let chars: Vec<char> = head.chars().collect();
    let boundary = chars.iter().rposition(|c| terminators.contains(c));
    match boundary {
        Some(pos) if pos + 1 >= 20 => chars[..=pos].iter().collect(),
        _ => {
            let mut cut: String = chars[..SUMMARY_MAX_CHARS - 1].iter().collect();
            cut.push('…');
            cut
        }
    }
}

/// Title for list headers: the first markdown heading, if any
fn extract_title(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim_start().strip_prefix('#'))
        .map(|rest| rest.trim_start_matches('#').trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Pure projection of a thread's messages into display-ready artifacts.
///
/// Deterministic: identical inputs produce byte-identical output, including
/// id stability and ordering (source message insertion order). Deduplicated
/// by artifact id.
pub fn project_thread(messages: &MessageStore, thread: &ThreadState) -> Vec<Artifact> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut artifacts = Vec::new();

    for message_id in &thread.message_ids {
        let Some(message) = messages.get(message_id) else {
            continue;
        };
        let flagged = thread.artifact_message_ids.contains(message_id);
        if !is_artifact_worthy(message, flagged) {
            continue;
        }
        let Some((kind, mime_tag)) = classify(message, flagged) else {
            continue;
        };

        let id = Artifact::id_for_message(message_id);
        if !seen.insert(id.clone()) {
            continue;
        }
        artifacts.push(Artifact {
            id,
            message_id: message_id.clone(),
            thread_id: thread.id.clone(),
            kind,
            mime: mime_tag.to_string(),
            title: extract_title(&message.content),
            summary: summarize(&message.content),
            content: message.content.clone(),
            agent: message.agent,
            streaming: message.is_streaming,
        });
    }

    artifacts
}

/// Merge rows from the external artifact-records table into an SSE-derived
/// projection. The stream-derived entry wins on id conflict; records only
/// add entries the stream has not produced (yet), ordered by creation time
/// after the projected ones.
pub fn merge_records(projected: &[Artifact], records: &[ArtifactRecord]) -> Vec<Artifact> {
    let known: HashSet<&str> = projected.iter().map(|a| a.id.as_str()).collect();

    let mut extra: Vec<&ArtifactRecord> = records
        .iter()
        .filter(|record| !known.contains(record.id.as_str()))
        .collect();
    extra.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut merged = projected.to_vec();
    merged.extend(extra.into_iter().map(|record| Artifact {
        id: record.id.clone(),
        message_id: record
            .id
            .strip_prefix("artifact-")
            .unwrap_or(&record.id)
            .to_string(),
        thread_id: record.trace_id.clone(),
        kind: record.record_type,
        mime: record.mime.clone(),
        title: None,
        summary: record.summary.clone(),
        content: String::new(),
        agent: None,
        streaming: false,
    }));
    merged
}
