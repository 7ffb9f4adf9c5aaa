use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use weft_store::{MessagePatch, SharedStore, WorkspaceStore};
use weft_types::{
    FinishReason, InterruptOption, MessageRole, MessageSource, Resource, ResearchSettings,
};

use crate::config::ClientConfig;
use crate::dispatch::{run_dispatcher, StreamFault};
use crate::error::{ClientError, Result};

/// Whether an ask opens a new research session or continues an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AskType {
    Initial,
    Followup,
}

/// Session coordinates required for a follow-up ask
#[derive(Debug, Clone)]
pub struct FollowupInfo {
    pub session_id: Option<i64>,
    pub thread_id: String,
    pub url_param: String,
}

#[derive(Debug, Serialize)]
struct AskResearchRequest<'a> {
    question: &'a str,
    ask_type: AskType,
    frontend_uuid: String,
    visitor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    config: &'a ResearchSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_param: Option<&'a str>,
}

/// One-shot creation/continuation response preceding the SSE stream
#[derive(Debug, Clone, Deserialize)]
pub struct AskResearchResponse {
    pub ask_type: String,
    pub url_param: String,
    pub thread_id: String,
    pub workspace_url: String,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub estimated_duration: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessageBody<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatStreamRequest<'a> {
    thread_id: &'a str,
    messages: Vec<ChatMessageBody<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interrupt_feedback: Option<String>,
    config: &'a ResearchSettings,
    locale: &'a str,
}

/// REST snapshot of a workspace, used to seed the identity map and settings
/// when a user opens a shared link (checkpoint/resume boundary)
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSnapshot {
    pub thread_id: String,
    pub url_param: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub artifacts: Vec<Value>,
    #[serde(default)]
    pub config: Option<Value>,
}

/// Optional attachments and interrupt feedback for a send
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub resources: Vec<Resource>,
    /// Explicit interrupt option value; when absent, a pending feedback
    /// selection recorded in the UI slice is claimed instead
    pub interrupt_feedback: Option<String>,
}

/// Handle on an in-flight stream. Aborting is cooperative: the read loop
/// stops, already-applied store mutations stay, and still-streaming
/// messages are finalized as cancelled.
pub struct StreamHandle {
    thread_id: String,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl StreamHandle {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the dispatcher to drain and finish
    pub async fn wait(self) {
        if let Err(e) = self.join.await {
            tracing::warn!("Dispatcher task failed: {}", e);
        }
    }
}

fn read_store(store: &SharedStore) -> RwLockReadGuard<'_, WorkspaceStore> {
    match store.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_store(store: &SharedStore) -> RwLockWriteGuard<'_, WorkspaceStore> {
    match store.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

struct InflightEntry {
    generation: u64,
    token: CancellationToken,
}

/// Imperative action API: talks to the research backend, then feeds the
/// resulting stream into the shared store.
///
/// One instance per app; holds the in-flight guard that makes rapid
/// duplicate sends abort-and-replace instead of silently queueing twice.
pub struct WorkspaceClient {
    http: reqwest::Client,
    config: ClientConfig,
    store: SharedStore,
    inflight: Mutex<HashMap<String, InflightEntry>>,
    next_generation: AtomicU64,
    faults: mpsc::Sender<StreamFault>,
}

impl WorkspaceClient {
    /// Returns the client plus the receiver for stream faults (toasts)
    pub fn new(config: ClientConfig, store: SharedStore) -> (Self, mpsc::Receiver<StreamFault>) {
        let (faults, fault_rx) = mpsc::channel(64);
        (
            Self {
                http: reqwest::Client::new(),
                config,
                store,
                inflight: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                faults,
            },
            fault_rx,
        )
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn validate_question(&self, question: &str) -> Result<()> {
        if question.trim().is_empty() {
            return Err(ClientError::EmptyQuestion);
        }
        if question.chars().count() > self.config.max_question_len {
            return Err(ClientError::QuestionTooLong {
                max: self.config.max_question_len,
            });
        }
        Ok(())
    }

    /// One-shot creation/continuation call preceding the SSE stream.
    /// Registers the returned identity mapping before handing the response
    /// back, so selectors keyed by url-param resolve immediately.
    pub async fn ask_research(
        &self,
        question: &str,
        ask_type: AskType,
        followup: Option<&FollowupInfo>,
    ) -> Result<AskResearchResponse> {
        self.validate_question(question)?;

        let request = AskResearchRequest {
            question,
            ask_type,
            frontend_uuid: Uuid::new_v4().to_string(),
            visitor_id: Uuid::new_v4().to_string(),
            user_id: None,
            config: &self.config.settings,
            session_id: followup.and_then(|f| f.session_id),
            thread_id: followup.map(|f| f.thread_id.as_str()),
            url_param: followup.map(|f| f.url_param.as_str()),
        };

        let response = self.http.post(self.config.ask_url()).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let ask: AskResearchResponse = response.json().await?;

        write_store(&self.store).bind_url_param(&ask.url_param, &ask.thread_id);
        Ok(ask)
    }

    /// Start (or continue) a thread's stream.
    ///
    /// A retriggered send while one is in flight for the same thread aborts
    /// and replaces it; the store only mutates after the stream request has
    /// been accepted, so a rejected call leaves state untouched and can be
    /// retried with the same payload.
    pub async fn send_message(
        &self,
        thread_id: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<StreamHandle> {
        self.validate_question(text)?;

        let token = CancellationToken::new();
        let generation = self.replace_inflight(thread_id, token.clone());

        // The pending feedback selection rides along without being consumed
        // yet; it is claimed only once the backend accepts the stream
        let feedback = options.interrupt_feedback.clone().or_else(|| {
            read_store(&self.store)
                .ui(thread_id)
                .and_then(|ui| ui.pending_feedback.as_ref().map(|o| o.value.clone()))
        });

        let request = ChatStreamRequest {
            thread_id,
            messages: vec![ChatMessageBody { role: "user", content: text }],
            resources: options.resources.clone(),
            interrupt_feedback: feedback.clone(),
            config: &self.config.settings,
            locale: &self.config.locale,
        };

        let stream = match weft_stream::connect(
            &self.http,
            &self.config.stream_url(),
            &request,
            token.clone(),
        )
        .await
        {
            Ok(stream) => stream,
            Err(e) => {
                self.clear_inflight(thread_id, generation);
                return Err(e.into());
            }
        };

        // Accepted: record the user's turn and settle the interrupt in one
        // mutation batch
        {
            let mut store = write_store(&self.store);
            let message_id = format!("user-{}", Uuid::new_v4());
            let mut patch = MessagePatch::new(&message_id)
                .thread(thread_id)
                .role(MessageRole::User);
            patch.source = Some(if feedback.is_some() {
                MessageSource::Button
            } else {
                MessageSource::Input
            });
            store.upsert_message(patch);
            store.append_content(&message_id, text);
            store.finalize_message(&message_id, FinishReason::Stop);

            if feedback.is_some() {
                store.remove_feedback(thread_id);
                store.resolve_interrupt(thread_id);
            }
        }

        let join = tokio::spawn(run_dispatcher(
            self.store.clone(),
            thread_id.to_string(),
            stream,
            self.faults.clone(),
        ));

        Ok(StreamHandle {
            thread_id: thread_id.to_string(),
            token,
            join,
        })
    }

    /// Record the user's interrupt choice; the next `send_message` attaches
    /// and clears it
    pub fn record_feedback(&self, thread_id: &str, option: InterruptOption) -> Result<()> {
        write_store(&self.store).set_feedback(thread_id, option)?;
        Ok(())
    }

    /// Abort a thread's in-flight stream, if any. Applied mutations stay.
    pub fn abort_stream(&self, thread_id: &str) {
        let mut inflight = match self.inflight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(entry) = inflight.remove(thread_id) {
            entry.token.cancel();
        }
    }

    /// Fetch the REST workspace snapshot for a shared link and seed the
    /// identity mapping from it
    pub async fn fetch_workspace(&self, url_param: &str) -> Result<WorkspaceSnapshot> {
        let response = self.http.get(self.config.workspace_url(url_param)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let snapshot: WorkspaceSnapshot = response.json().await?;
        write_store(&self.store).bind_url_param(&snapshot.url_param, &snapshot.thread_id);
        Ok(snapshot)
    }

    fn replace_inflight(&self, thread_id: &str, token: CancellationToken) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut inflight = match self.inflight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = inflight.insert(thread_id.to_string(), InflightEntry { generation, token }) {
            if !previous.token.is_cancelled() {
                tracing::info!(thread_id, "Aborting in-flight stream replaced by a new send");
                previous.token.cancel();
            }
        }
        generation
    }

    fn clear_inflight(&self, thread_id: &str, generation: u64) {
        let mut inflight = match self.inflight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Only remove our own registration; a newer send may have replaced it
        if inflight.get(thread_id).map(|e| e.generation) == Some(generation) {
            inflight.remove(thread_id);
        }
    }
}
