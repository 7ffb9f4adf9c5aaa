use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use weft_types::{
    AgentKind, Artifact, ArtifactRecord, FinishReason, InterruptOption, Message, MessagePayload,
    MessageRole, OriginalInput, StreamEvent,
};

use crate::artifacts::{merge_records, project_thread};
use crate::error::{Result, StoreError};
use crate::identity::IdentityMap;
use crate::messages::{MessagePatch, MessageStore, UpsertOutcome};
use crate::threads::{ProgressSnapshot, ThreadState};
use crate::ui::UiState;

/// Shared handle: many concurrent readers, one dispatcher writer per frame
pub type SharedStore = Arc<RwLock<WorkspaceStore>>;

#[derive(Default)]
struct ProjectionCache {
    entries: HashMap<String, (u64, Arc<[Artifact]>)>,
}

/// The unified client store: normalized messages, per-thread research
/// aggregates, identity mapping, and ephemeral UI state.
///
/// Explicitly constructed (no globals); created at app start, torn down on
/// sign-out or test teardown. All mutation goes through these synchronous,
/// non-awaiting methods, so one SSE frame's updates are applied atomically
/// from the perspective of any reader between frames. A mutation scoped to
/// one thread never touches another thread's state.
pub struct WorkspaceStore {
    messages: MessageStore,
    threads: HashMap<String, ThreadState>,
    identity: IdentityMap,
    ui: HashMap<String, UiState>,
    revision: u64,
    projection: Mutex<ProjectionCache>,
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceStore {
    pub fn new() -> Self {
        Self {
            messages: MessageStore::new(),
            threads: HashMap::new(),
            identity: IdentityMap::new(),
            ui: HashMap::new(),
            revision: 0,
            projection: Mutex::new(ProjectionCache::default()),
        }
    }

    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Monotonic counter bumped on every mutation batch; derived views key
    /// their memoization on it
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn thread_entry(&mut self, thread_id: &str) -> &mut ThreadState {
        self.threads
            .entry(thread_id.to_string())
            .or_insert_with(|| ThreadState::new(thread_id))
    }

    fn ui_entry(&mut self, thread_id: &str) -> &mut UiState {
        self.ui.entry(thread_id.to_string()).or_default()
    }

    // ---- identity ----------------------------------------------------

    pub fn bind_url_param(&mut self, url_param: &str, thread_id: &str) {
        self.identity.bind(url_param, thread_id);
        self.thread_entry(thread_id);
        self.bump();
    }

    pub fn resolve_url_param(&self, url_param: &str) -> Option<&str> {
        self.identity.resolve(url_param)
    }

    pub fn url_param_for(&self, thread_id: &str) -> Option<&str> {
        self.identity.url_param_for(thread_id)
    }

    // ---- message operations ------------------------------------------

    /// Insert-or-merge a message and keep the owning thread's ordered id
    /// list in sync. The message insert always precedes any index update
    /// that references it.
    pub fn upsert_message(&mut self, patch: MessagePatch) -> UpsertOutcome {
        let id = patch.id.clone();
        let thread_id = patch.thread_id.clone();
        let outcome = self.messages.upsert(patch);

        if let Some(thread_id) = thread_id {
            if matches!(outcome, UpsertOutcome::Created | UpsertOutcome::Reconciled) {
                self.thread_entry(&thread_id).push_message_id(&id);
            }
        }
        self.bump();
        outcome
    }

    pub fn append_content(&mut self, id: &str, chunk: &str) {
        self.messages.append_content(id, chunk);
        self.bump();
    }

    pub fn append_reasoning(&mut self, id: &str, chunk: &str) {
        self.messages.append_reasoning(id, chunk);
        self.bump();
    }

    pub fn finalize_message(&mut self, id: &str, reason: FinishReason) {
        self.messages.finalize(id, reason);
        self.bump();
    }

    /// Finalize with `interrupt` and move the thread's interrupt pointers in
    /// the same mutation batch
    pub fn apply_interrupt(
        &mut self,
        thread_id: &str,
        message_id: &str,
        content: Option<&str>,
        options: Vec<InterruptOption>,
    ) {
        let mut patch = MessagePatch::new(message_id)
            .thread(thread_id)
            .role(MessageRole::Assistant);
        patch.options = Some(options);
        self.messages.upsert(patch);
        self.thread_entry(thread_id).push_message_id(message_id);
        if let Some(content) = content {
            if !content.is_empty() {
                self.messages.append_content(message_id, content);
            }
        }
        self.messages.finalize(message_id, FinishReason::Interrupt);
        self.thread_entry(thread_id).set_interrupt(message_id);
        self.bump();
    }

    /// Remove all messages and index entries for a thread. Explicit
    /// user-initiated reset only (the re-ask flow).
    pub fn clear_thread(&mut self, thread_id: &str) -> Result<()> {
        let thread = self
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| StoreError::UnknownThread(thread_id.to_string()))?;
        thread.clear_indices();
        self.messages.remove_thread(thread_id);
        self.bump();
        Ok(())
    }

    /// Destroy a thread entirely (closing a task in the multi-task panel)
    pub fn remove_thread(&mut self, thread_id: &str) -> Result<()> {
        if self.threads.remove(thread_id).is_none() {
            return Err(StoreError::UnknownThread(thread_id.to_string()));
        }
        self.messages.remove_thread(thread_id);
        self.ui.remove(thread_id);
        self.identity.forget_thread(thread_id);
        self.bump();
        Ok(())
    }

    /// Wipe everything (full sign-out, test setup)
    pub fn reset(&mut self) {
        self.messages.clear();
        self.threads.clear();
        self.ui.clear();
        self.identity.clear();
        match self.projection.lock() {
            Ok(mut cache) => cache.entries.clear(),
            Err(poisoned) => poisoned.into_inner().entries.clear(),
        }
        self.bump();
    }

    /// Force-finalize every still-streaming message of a thread, used when
    /// its stream is aborted. Already-applied content stays; the distinct
    /// terminal state keeps the UI from showing an infinite spinner.
    pub fn finalize_still_streaming(&mut self, thread_id: &str, reason: FinishReason) -> Vec<String> {
        let ids = self.still_streaming_ids(thread_id);
        for id in &ids {
            self.messages.finalize(id, reason);
        }
        if !ids.is_empty() {
            self.bump();
        }
        ids
    }

    // ---- research selection & feedback -------------------------------

    pub fn open_research(&mut self, thread_id: &str, research_id: &str) {
        if let Some(thread) = self.threads.get_mut(thread_id) {
            if thread.open_research(research_id) {
                self.bump();
            }
        } else {
            tracing::warn!(thread_id, "open_research on unknown thread");
        }
    }

    pub fn close_research(&mut self, thread_id: &str) {
        if let Some(thread) = self.threads.get_mut(thread_id) {
            thread.close_research();
            self.bump();
        }
    }

    pub fn set_feedback(&mut self, thread_id: &str, option: InterruptOption) -> Result<()> {
        if !self.threads.contains_key(thread_id) {
            return Err(StoreError::UnknownThread(thread_id.to_string()));
        }
        self.ui_entry(thread_id).set_feedback(option);
        self.bump();
        Ok(())
    }

    pub fn remove_feedback(&mut self, thread_id: &str) -> Option<InterruptOption> {
        let taken = self.ui.get_mut(thread_id)?.remove_feedback();
        if taken.is_some() {
            self.bump();
        }
        taken
    }

    /// Clear the outstanding interrupt pointers after feedback is submitted
    pub fn resolve_interrupt(&mut self, thread_id: &str) {
        if let Some(thread) = self.threads.get_mut(thread_id) {
            thread.resolve_interrupt();
            self.bump();
        }
    }

    pub fn ui(&self, thread_id: &str) -> Option<&UiState> {
        self.ui.get(thread_id)
    }

    pub fn ui_state_mut(&mut self, thread_id: &str) -> &mut UiState {
        self.bump();
        self.ui_entry(thread_id)
    }

    // ---- event ingestion ---------------------------------------------

    /// Apply one decoded stream event. The whole batch of mutations for the
    /// event is synchronous, so readers only ever observe frame boundaries.
    pub fn apply_event(&mut self, event: &StreamEvent) {
        let now = Utc::now();
        if let Some(thread_id) = event.thread_id() {
            self.thread_entry(thread_id).touch(now);
        }

        match event {
            StreamEvent::Navigation { url_param, thread_id, .. } => {
                self.identity.bind(url_param, thread_id);
                self.thread_entry(thread_id);
                self.ui_entry(thread_id).focused_url_param = Some(url_param.clone());
            }

            StreamEvent::Metadata { thread_id, execution_id, .. } => {
                if let Some(thread_id) = thread_id {
                    self.thread_entry(thread_id).execution_id = execution_id.clone();
                }
            }

            StreamEvent::Progress {
                thread_id,
                current_step,
                progress_percentage,
                status_message,
                ..
            } => {
                if let Some(thread_id) = thread_id {
                    self.thread_entry(thread_id).progress = Some(ProgressSnapshot {
                        current_step: current_step.clone(),
                        progress_percentage: *progress_percentage,
                        status_message: status_message.clone(),
                    });
                }
            }

            StreamEvent::MessageChunk(payload) => self.apply_message_payload(payload, false),
            StreamEvent::ToolCalls(payload) | StreamEvent::ToolCallChunks(payload) => {
                self.apply_message_payload(payload, true)
            }
            StreamEvent::ToolCallResult(payload) => {
                let mut patch = MessagePatch::new(&payload.id).role(MessageRole::Tool);
                if let Some(thread_id) = &payload.thread_id {
                    patch = patch.thread(thread_id.clone());
                }
                if let Some(agent) = payload.agent {
                    patch = patch.agent(agent);
                }
                self.upsert_from_payload(patch, payload);
            }

            StreamEvent::PlanGenerated { thread_id, id, agent, plan } => {
                let agent = agent.unwrap_or(AgentKind::Planner);
                let mut patch = MessagePatch::new(id).role(MessageRole::Assistant).agent(agent);
                if let Some(thread_id) = thread_id {
                    patch = patch.thread(thread_id.clone());
                }
                self.upsert_message_internal(patch);
                if self
                    .messages
                    .get(id)
                    .map(|m| m.content.is_empty())
                    .unwrap_or(false)
                {
                    if let Ok(rendered) = serde_json::to_string_pretty(plan) {
                        self.messages.append_content(id, &rendered);
                    }
                }
                if let Some(thread_id) = thread_id.clone() {
                    self.note_research_message(&thread_id, id, agent);
                }
            }

            StreamEvent::SearchResults { thread_id, id, query, results } => {
                let mut patch = MessagePatch::new(id)
                    .role(MessageRole::Assistant)
                    .agent(AgentKind::Researcher);
                if let Some(thread_id) = thread_id {
                    patch = patch.thread(thread_id.clone());
                }
                self.upsert_message_internal(patch);
                if self
                    .messages
                    .get(id)
                    .map(|m| m.content.is_empty())
                    .unwrap_or(false)
                {
                    let body = serde_json::json!({ "query": query, "results": results });
                    if let Ok(rendered) = serde_json::to_string(&body) {
                        self.messages.append_content(id, &rendered);
                    }
                }
                if let Some(thread_id) = thread_id.clone() {
                    self.note_research_message(&thread_id, id, AgentKind::Researcher);
                }
            }

            StreamEvent::AgentOutput { thread_id, id, agent, content } => {
                let agent = agent.unwrap_or(AgentKind::Researcher);
                let mut patch = MessagePatch::new(id).role(MessageRole::Assistant).agent(agent);
                if let Some(thread_id) = thread_id {
                    patch = patch.thread(thread_id.clone());
                }
                self.upsert_message_internal(patch);
                self.messages.append_content(id, content);
                if let Some(thread_id) = thread_id.clone() {
                    self.note_research_message(&thread_id, id, agent);
                }
            }

            StreamEvent::NodeStart { thread_id, node, .. } => {
                tracing::debug!(?thread_id, node, "Pipeline node started");
            }
            StreamEvent::NodeComplete { thread_id, node, status, .. } => {
                tracing::debug!(?thread_id, node, ?status, "Pipeline node completed");
            }

            StreamEvent::ArtifactHint { artifact_id, thread_id, metadata, .. } => {
                if let Some(thread_id) = thread_id {
                    // An explicit flag from the producer beats content
                    // sniffing: remember which message the hint points at
                    let message_id = metadata
                        .get("message_id")
                        .and_then(|v| v.as_str())
                        .unwrap_or(artifact_id)
                        .to_string();
                    self.thread_entry(thread_id)
                        .artifact_message_ids
                        .insert(message_id);
                }
            }

            StreamEvent::Interrupt { thread_id, id, content, options, .. } => {
                if let Some(thread_id) = thread_id.clone() {
                    self.apply_interrupt_internal(&thread_id, id, content.as_deref(), options.clone());
                } else {
                    tracing::warn!(message_id = %id, "Interrupt without thread id; dropping");
                }
            }

            StreamEvent::Reask { thread_id, id, content, original_input } => {
                if let Some(thread_id) = thread_id.clone() {
                    self.apply_reask(&thread_id, id, content.as_deref(), original_input.clone());
                }
            }

            StreamEvent::Complete { thread_id, .. } => {
                if let Some(thread_id) = thread_id.clone() {
                    for id in self.still_streaming_ids(&thread_id) {
                        self.messages.finalize(&id, FinishReason::Stop);
                    }
                    let thread = self.thread_entry(&thread_id);
                    thread.ongoing_research_id = None;
                    thread.progress = None;
                }
            }

            StreamEvent::Error { thread_id, error_code, error_message, .. } => {
                // Surfacing is the dispatcher's job; existing state stays
                // untouched
                tracing::warn!(?thread_id, ?error_code, "Stream error event: {}", error_message);
            }
        }

        self.bump();
    }

    /// Shared handling for the chunked message events
    fn apply_message_payload(&mut self, payload: &MessagePayload, tool_event: bool) {
        let mut patch = MessagePatch::new(&payload.id);
        if let Some(thread_id) = &payload.thread_id {
            patch = patch.thread(thread_id.clone());
        }
        if let Some(role) = payload.role {
            patch = patch.role(role);
        }
        if let Some(agent) = payload.agent {
            patch = patch.agent(agent);
        }
        self.upsert_from_payload(patch, payload);

        if tool_event && !payload.tool_call_chunks.is_empty() {
            self.messages
                .merge_tool_call_chunks(&payload.id, &payload.tool_call_chunks);
        }

        if let (Some(thread_id), Some(agent)) = (&payload.thread_id, payload.agent) {
            self.note_research_message(&thread_id.clone(), &payload.id, agent);
        }
    }

    /// Upsert + append + finalize in event order for one payload
    fn upsert_from_payload(&mut self, patch: MessagePatch, payload: &MessagePayload) {
        self.upsert_message_internal(patch);
        if let Some(content) = &payload.content {
            if !content.is_empty() {
                self.messages.append_content(&payload.id, content);
            }
        }
        if let Some(reasoning) = &payload.reasoning_content {
            if !reasoning.is_empty() {
                self.messages.append_reasoning(&payload.id, reasoning);
            }
        }
        if let Some(reason) = payload.finish_reason {
            self.messages.finalize(&payload.id, reason);
        }
    }

    fn upsert_message_internal(&mut self, patch: MessagePatch) {
        let id = patch.id.clone();
        let thread_id = patch.thread_id.clone();
        let outcome = self.messages.upsert(patch);
        if let Some(thread_id) = thread_id {
            if matches!(outcome, UpsertOutcome::Created | UpsertOutcome::Reconciled) {
                self.thread_entry(&thread_id).push_message_id(&id);
            }
        }
    }

    fn apply_interrupt_internal(
        &mut self,
        thread_id: &str,
        message_id: &str,
        content: Option<&str>,
        options: Vec<InterruptOption>,
    ) {
        let mut patch = MessagePatch::new(message_id)
            .thread(thread_id)
            .role(MessageRole::Assistant);
        patch.options = Some(options);
        self.upsert_message_internal(patch);
        if let Some(content) = content {
            if !content.is_empty() {
                self.messages.append_content(message_id, content);
            }
        }
        self.messages.finalize(message_id, FinishReason::Interrupt);
        self.thread_entry(thread_id).set_interrupt(message_id);
    }

    fn apply_reask(
        &mut self,
        thread_id: &str,
        message_id: &str,
        content: Option<&str>,
        original_input: OriginalInput,
    ) {
        // Re-ask wipes the conversation and leaves one terminal message
        // carrying the restored original input
        if self.threads.contains_key(thread_id) {
            let _ = self.clear_thread(thread_id);
        }
        let mut patch = MessagePatch::new(message_id)
            .thread(thread_id)
            .role(MessageRole::Assistant);
        patch.original_input = Some(original_input);
        self.upsert_message_internal(patch);
        if let Some(content) = content {
            if !content.is_empty() {
                self.messages.append_content(message_id, content);
            }
        }
        self.messages.finalize(message_id, FinishReason::Reask);
    }

    /// Research-unit bookkeeping for a message attributed to an agent.
    /// Runs after the message insert, so pointers never dangle.
    fn note_research_message(&mut self, thread_id: &str, message_id: &str, agent: AgentKind) {
        if !agent.is_research_agent() {
            return;
        }
        let thread = self.thread_entry(thread_id);

        let research_id = if let Some(existing) = thread.research_of_message(message_id) {
            existing
        } else if let Some(ongoing) = thread.ongoing_research_id.clone() {
            ongoing
        } else {
            thread.start_research(message_id);
            message_id.to_string()
        };

        match agent {
            AgentKind::Planner => thread.record_plan(&research_id, message_id),
            AgentKind::Reporter => thread.record_report(&research_id, message_id),
            AgentKind::PodcastGenerator => thread.record_podcast(&research_id, message_id),
            AgentKind::Researcher | AgentKind::Coder => {
                if research_id != message_id {
                    thread.record_activity(&research_id, message_id);
                }
            }
            _ => {}
        }
    }

    fn still_streaming_ids(&self, thread_id: &str) -> Vec<String> {
        self.threads
            .get(thread_id)
            .map(|thread| {
                thread
                    .message_ids
                    .iter()
                    .filter(|id| {
                        self.messages
                            .get(id)
                            .map(|m| m.is_streaming)
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- selectors ----------------------------------------------------

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn thread(&self, thread_id: &str) -> Option<&ThreadState> {
        self.threads.get(thread_id)
    }

    pub fn thread_by_url_param(&self, url_param: &str) -> Option<&ThreadState> {
        let thread_id = self.identity.resolve(url_param)?;
        self.threads.get(thread_id)
    }

    pub fn thread_ids(&self) -> Vec<&str> {
        self.threads.keys().map(String::as_str).collect()
    }

    /// Messages of a thread in insertion order
    pub fn thread_messages(&self, thread_id: &str) -> Vec<&Message> {
        self.threads
            .get(thread_id)
            .map(|thread| {
                thread
                    .message_ids
                    .iter()
                    .filter_map(|id| self.messages.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn ongoing_research_id(&self, thread_id: &str) -> Option<&str> {
        self.threads.get(thread_id)?.ongoing_research_id.as_deref()
    }

    pub fn open_research_id(&self, thread_id: &str) -> Option<&str> {
        self.threads.get(thread_id)?.open_research_id.as_deref()
    }

    /// The message holding the outstanding interrupt, if any
    pub fn waiting_for_feedback(&self, thread_id: &str) -> Option<&Message> {
        let id = self
            .threads
            .get(thread_id)?
            .waiting_for_feedback_message_id
            .as_deref()?;
        self.messages.get(id)
    }

    pub fn research_plan(&self, thread_id: &str, research_id: &str) -> Option<&Message> {
        let id = self.threads.get(thread_id)?.research_plan_ids.get(research_id)?;
        self.messages.get(id)
    }

    pub fn research_report(&self, thread_id: &str, research_id: &str) -> Option<&Message> {
        let id = self.threads.get(thread_id)?.research_report_ids.get(research_id)?;
        self.messages.get(id)
    }

    pub fn research_podcast(&self, thread_id: &str, research_id: &str) -> Option<&Message> {
        let id = self.threads.get(thread_id)?.research_podcast_ids.get(research_id)?;
        self.messages.get(id)
    }

    pub fn research_activities(&self, thread_id: &str, research_id: &str) -> Vec<&Message> {
        self.threads
            .get(thread_id)
            .and_then(|thread| thread.research_activity_ids.get(research_id))
            .map(|ids| ids.iter().filter_map(|id| self.messages.get(id)).collect())
            .unwrap_or_default()
    }

    /// Presentation helper layered on top of the store: a thread with no
    /// recent frames and an unfinished stream counts as stalled
    pub fn is_stalled(&self, thread_id: &str, now: DateTime<Utc>, threshold: Duration) -> bool {
        let Some(thread) = self.threads.get(thread_id) else {
            return false;
        };
        let streaming = thread.message_ids.iter().any(|id| {
            self.messages
                .get(id)
                .map(|m| m.is_streaming)
                .unwrap_or(false)
        });
        match (streaming, thread.last_event_at) {
            (true, Some(at)) => now - at > threshold,
            _ => false,
        }
    }

    /// Display-ready artifacts for a thread, memoized on the store revision:
    /// repeated reads of unchanged state return the same allocation
    /// (pointer-equal), keeping downstream diffing cheap.
    pub fn artifacts(&self, thread_id: &str) -> Arc<[Artifact]> {
        let mut cache = match self.projection.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some((revision, cached)) = cache.entries.get(thread_id) {
            if *revision == self.revision {
                return Arc::clone(cached);
            }
        }

        let projected: Arc<[Artifact]> = self
            .threads
            .get(thread_id)
            .map(|thread| project_thread(&self.messages, thread))
            .unwrap_or_default()
            .into();
        cache
            .entries
            .insert(thread_id.to_string(), (self.revision, Arc::clone(&projected)));
        projected
    }

    /// Artifacts merged with rows from the external records table
    pub fn artifacts_with_records(&self, thread_id: &str, records: &[ArtifactRecord]) -> Vec<Artifact> {
        merge_records(&self.artifacts(thread_id), records)
    }
}
