use std::sync::RwLockWriteGuard;

use futures::StreamExt;
use tokio::sync::mpsc;
use weft_store::{SharedStore, WorkspaceStore};
use weft_stream::EventStream;
use weft_types::{FinishReason, StreamEvent};

/// Stream problem surfaced to the UI (toast/banner). State up to the fault
/// is preserved; the fault never corrupts it.
#[derive(Debug, Clone)]
pub struct StreamFault {
    pub thread_id: String,
    pub error_code: Option<String>,
    pub message: String,
    pub suggestions: Vec<String>,
}

fn write_store(store: &SharedStore) -> RwLockWriteGuard<'_, WorkspaceStore> {
    match store.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Drain a thread's event stream into the store.
///
/// Each event is applied as one synchronous mutation batch under a single
/// write-lock acquisition, so readers only ever observe frame boundaries.
/// Error events additionally go to the fault sink. When the stream ends
/// without a terminal `complete` (abort, transport loss, server hangup),
/// any message still streaming in this thread is force-finalized with the
/// distinguished `cancelled` state so the UI never spins forever.
pub async fn run_dispatcher(
    store: SharedStore,
    thread_id: String,
    mut stream: EventStream,
    faults: mpsc::Sender<StreamFault>,
) {
    let mut saw_terminal = false;

    while let Some(event) = stream.next().await {
        if let StreamEvent::Error { thread_id: event_thread, error_code, error_message, suggestions } = &event {
            let fault = StreamFault {
                thread_id: event_thread.clone().unwrap_or_else(|| thread_id.clone()),
                error_code: error_code.clone(),
                message: error_message.clone(),
                suggestions: suggestions.clone(),
            };
            if faults.send(fault).await.is_err() {
                tracing::debug!("Fault sink closed; dropping stream error notification");
            }
        }
        if matches!(event, StreamEvent::Complete { .. }) {
            saw_terminal = true;
        }

        write_store(&store).apply_event(&event);
    }

    if !saw_terminal {
        let finalized = write_store(&store).finalize_still_streaming(&thread_id, FinishReason::Cancelled);
        if !finalized.is_empty() {
            tracing::info!(
                thread_id = %thread_id,
                count = finalized.len(),
                "Stream ended without terminal event; force-finalized streaming messages"
            );
        }
    }
}
