pub mod artifacts;
pub mod error;
pub mod identity;
pub mod messages;
pub mod threads;
pub mod ui;
pub mod workspace;

pub use artifacts::{merge_records, project_thread, summarize, SUBSTANTIAL_CONTENT_LEN};
pub use error::StoreError;
pub use identity::IdentityMap;
pub use messages::{AppendOutcome, MessagePatch, MessageStore, UpsertOutcome};
pub use threads::{ProgressSnapshot, ThreadState};
pub use ui::UiState;
pub use workspace::{SharedStore, WorkspaceStore};
