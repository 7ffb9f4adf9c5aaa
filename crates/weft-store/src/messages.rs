use std::collections::HashMap;

use weft_types::{
    AgentKind, FinishReason, InterruptOption, Message, MessageRole, MessageSource, OriginalInput,
    ToolCallChunk, ToolCallSnapshot,
};

/// Partial message used by upsert: `None` fields are left untouched on merge
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub id: String,
    pub thread_id: Option<String>,
    pub role: Option<MessageRole>,
    pub agent: Option<AgentKind>,
    pub source: Option<MessageSource>,
    pub options: Option<Vec<InterruptOption>>,
    pub original_input: Option<OriginalInput>,
}

impl MessagePatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn role(mut self, role: MessageRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn agent(mut self, agent: AgentKind) -> Self {
        self.agent = Some(agent);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Merged,
    /// An earlier chunk arrived before its creation event; this upsert filled
    /// in the missing fields of the placeholder
    Reconciled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Chunk arrived before the creation event; a placeholder was created so
    /// the content is not lost
    CreatedPlaceholder,
    /// Chunk arrived after finalization; applied anyway but anomalous
    LateAppend,
}

/// Normalized table of messages keyed by id.
///
/// Content accumulation is append-only while a message streams; the raw
/// chunk sequence is kept alongside so it stays recoverable for replay.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: HashMap<String, Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Insert with streaming defaults, or shallow-merge the provided fields
    /// into the existing entry. Content never flows through upsert; chunks go
    /// through the append operations so the append-only invariant holds.
    pub fn upsert(&mut self, patch: MessagePatch) -> UpsertOutcome {
        match self.messages.get_mut(&patch.id) {
            Some(existing) => {
                let reconciling = existing.thread_id.is_empty() && patch.thread_id.is_some();
                if let Some(thread_id) = patch.thread_id {
                    if existing.thread_id.is_empty() {
                        existing.thread_id = thread_id;
                    }
                }
                if let Some(role) = patch.role {
                    existing.role = role;
                }
                if let Some(agent) = patch.agent {
                    existing.agent = Some(agent);
                }
                if let Some(source) = patch.source {
                    existing.source = Some(source);
                }
                if let Some(options) = patch.options {
                    existing.options = options;
                }
                if let Some(original_input) = patch.original_input {
                    existing.original_input = Some(original_input);
                }
                if reconciling {
                    UpsertOutcome::Reconciled
                } else {
                    UpsertOutcome::Merged
                }
            }
            None => {
                let mut message = Message::streaming(
                    patch.id.clone(),
                    patch.thread_id.unwrap_or_default(),
                    patch.role.unwrap_or(MessageRole::Assistant),
                );
                message.agent = patch.agent;
                message.source = patch.source;
                message.options = patch.options.unwrap_or_default();
                message.original_input = patch.original_input;
                self.messages.insert(patch.id, message);
                UpsertOutcome::Created
            }
        }
    }

    /// Append a content chunk. A chunk that precedes its creation event
    /// lazily creates a placeholder message so nothing is lost; the later
    /// upsert reconciles the missing fields.
    pub fn append_content(&mut self, id: &str, chunk: &str) -> AppendOutcome {
        match self.messages.get_mut(id) {
            Some(message) => {
                let late = !message.is_streaming;
                if late {
                    tracing::warn!(message_id = id, "Content chunk arrived after finalization");
                }
                message.content.push_str(chunk);
                message.content_chunks.push(chunk.to_string());
                if late {
                    AppendOutcome::LateAppend
                } else {
                    AppendOutcome::Appended
                }
            }
            None => {
                tracing::warn!(message_id = id, "Content chunk preceded creation event; creating placeholder");
                let mut message = Message::streaming(id, "", MessageRole::Assistant);
                message.content.push_str(chunk);
                message.content_chunks.push(chunk.to_string());
                self.messages.insert(id.to_string(), message);
                AppendOutcome::CreatedPlaceholder
            }
        }
    }

    /// Append a reasoning ("thinking") chunk, same semantics as content
    pub fn append_reasoning(&mut self, id: &str, chunk: &str) -> AppendOutcome {
        match self.messages.get_mut(id) {
            Some(message) => {
                let late = !message.is_streaming;
                if late {
                    tracing::warn!(message_id = id, "Reasoning chunk arrived after finalization");
                }
                message
                    .reasoning_content
                    .get_or_insert_with(String::new)
                    .push_str(chunk);
                if late {
                    AppendOutcome::LateAppend
                } else {
                    AppendOutcome::Appended
                }
            }
            None => {
                tracing::warn!(message_id = id, "Reasoning chunk preceded creation event; creating placeholder");
                let mut message = Message::streaming(id, "", MessageRole::Assistant);
                message.reasoning_content = Some(chunk.to_string());
                self.messages.insert(id.to_string(), message);
                AppendOutcome::CreatedPlaceholder
            }
        }
    }

    /// Merge incremental tool-call fragments and reassemble the call
    /// snapshots, keyed by chunk index
    pub fn merge_tool_call_chunks(&mut self, id: &str, chunks: &[ToolCallChunk]) {
        let message = self.messages.entry(id.to_string()).or_insert_with(|| {
            tracing::warn!(message_id = id, "Tool-call chunk preceded creation event; creating placeholder");
            Message::streaming(id, "", MessageRole::Assistant)
        });
        message.tool_call_chunks.extend_from_slice(chunks);
        message.tool_calls = assemble_tool_calls(&message.tool_call_chunks);
    }

    /// Set the terminal state exactly once. A second finalization is a
    /// logged no-op; the first reason wins.
    pub fn finalize(&mut self, id: &str, reason: FinishReason) -> bool {
        match self.messages.get_mut(id) {
            Some(message) => {
                if message.finish_reason.is_some() {
                    tracing::warn!(
                        message_id = id,
                        ?reason,
                        "Ignoring repeated finalization; message is already terminal"
                    );
                    return false;
                }
                message.is_streaming = false;
                message.finish_reason = Some(reason);
                true
            }
            None => {
                tracing::warn!(message_id = id, "Finalize for unknown message id; ignoring");
                false
            }
        }
    }

    /// Remove every message belonging to a thread; returns the removed ids
    pub fn remove_thread(&mut self, thread_id: &str) -> Vec<String> {
        let ids: Vec<String> = self
            .messages
            .values()
            .filter(|m| m.thread_id == thread_id)
            .map(|m| m.id.clone())
            .collect();
        for id in &ids {
            self.messages.remove(id);
        }
        ids
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Assemble ordered call snapshots from accumulated fragments. Fragments
/// with the same index extend one call: id/name fill in once, argument
/// strings concatenate.
fn assemble_tool_calls(chunks: &[ToolCallChunk]) -> Vec<ToolCallSnapshot> {
    let mut order: Vec<u32> = Vec::new();
    let mut by_index: HashMap<u32, ToolCallSnapshot> = HashMap::new();

    for chunk in chunks {
        let entry = by_index.entry(chunk.index).or_insert_with(|| {
            order.push(chunk.index);
            ToolCallSnapshot {
                id: format!("call_{}", chunk.index),
                name: String::new(),
                arguments: String::new(),
            }
        });
        if let Some(id) = &chunk.id {
            entry.id = id.clone();
        }
        if let Some(name) = &chunk.name {
            entry.name = name.clone();
        }
        if let Some(arguments) = &chunk.arguments {
            entry.arguments.push_str(arguments);
        }
    }

    order
        .into_iter()
        .filter_map(|index| by_index.remove(&index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_then_append() {
        let mut store = MessageStore::new();
        let outcome = store.upsert(MessagePatch::new("m1").thread("t1"));
        assert_eq!(outcome, UpsertOutcome::Created);

        store.append_content("m1", "你好");
        store.append_content("m1", "，我将开始研究");

        let msg = store.get("m1").unwrap();
        assert_eq!(msg.content, "你好，我将开始研究");
        assert_eq!(msg.content_chunks.len(), 2);
        assert!(msg.is_streaming);
    }

    #[test]
    fn test_chunk_before_create_not_lost() {
        let mut store = MessageStore::new();
        let outcome = store.append_content("m9", "early");
        assert_eq!(outcome, AppendOutcome::CreatedPlaceholder);

        // Creation event lands later and reconciles the thread id
        let outcome = store.upsert(MessagePatch::new("m9").thread("t1").agent(AgentKind::Reporter));
        assert_eq!(outcome, UpsertOutcome::Reconciled);

        let msg = store.get("m9").unwrap();
        assert_eq!(msg.content, "early");
        assert_eq!(msg.thread_id, "t1");
        assert_eq!(msg.agent, Some(AgentKind::Reporter));
    }

    #[test]
    fn test_finalize_once() {
        let mut store = MessageStore::new();
        store.upsert(MessagePatch::new("m1").thread("t1"));
        assert!(store.finalize("m1", FinishReason::Stop));
        assert!(!store.finalize("m1", FinishReason::Interrupt));

        let msg = store.get("m1").unwrap();
        assert_eq!(msg.finish_reason, Some(FinishReason::Stop));
        assert!(!msg.is_streaming);
    }

    #[test]
    fn test_late_append_flagged_but_applied() {
        let mut store = MessageStore::new();
        store.upsert(MessagePatch::new("m1").thread("t1"));
        store.append_content("m1", "body");
        store.finalize("m1", FinishReason::Stop);

        let outcome = store.append_content("m1", " tail");
        assert_eq!(outcome, AppendOutcome::LateAppend);
        assert_eq!(store.get("m1").unwrap().content, "body tail");
    }

    #[test]
    fn test_tool_call_assembly_across_chunks() {
        let mut store = MessageStore::new();
        store.upsert(MessagePatch::new("m1").thread("t1"));
        store.merge_tool_call_chunks(
            "m1",
            &[ToolCallChunk {
                index: 0,
                id: Some("call_abc".to_string()),
                name: Some("web_search".to_string()),
                arguments: Some("{\"query\":".to_string()),
            }],
        );
        store.merge_tool_call_chunks(
            "m1",
            &[ToolCallChunk {
                index: 0,
                id: None,
                name: None,
                arguments: Some("\"rust\"}".to_string()),
            }],
        );

        let calls = &store.get("m1").unwrap().tool_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].name, "web_search");
        assert_eq!(calls[0].arguments, "{\"query\":\"rust\"}");
    }

    #[test]
    fn test_remove_thread_scoped() {
        let mut store = MessageStore::new();
        store.upsert(MessagePatch::new("a1").thread("t1"));
        store.upsert(MessagePatch::new("b1").thread("t2"));

        let removed = store.remove_thread("t1");
        assert_eq!(removed, vec!["a1".to_string()]);
        assert!(store.get("a1").is_none());
        assert!(store.get("b1").is_some());
    }
}
