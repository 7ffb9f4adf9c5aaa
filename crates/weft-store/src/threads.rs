use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

/// Last reported pipeline progress, presentation-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub current_step: String,
    pub progress_percentage: Option<u8>,
    pub status_message: Option<String>,
}

/// Per-thread derived indices over the message table.
///
/// A research unit is keyed by the id of the message that starts it; plan,
/// report, podcast and activity pointers hang off that key. Pointer values
/// always reference messages already inserted for this thread.
#[derive(Debug, Default)]
pub struct ThreadState {
    pub id: String,
    /// Insertion order = causal/display order; no duplicates
    pub message_ids: Vec<String>,
    /// Message ids that start a research unit, in order of appearance
    pub research_ids: Vec<String>,
    pub research_plan_ids: HashMap<String, String>,
    pub research_report_ids: HashMap<String, String>,
    pub research_podcast_ids: HashMap<String, String>,
    pub research_activity_ids: HashMap<String, Vec<String>>,
    /// At most one research unit streams at a time
    pub ongoing_research_id: Option<String>,
    /// UI selection; independent of the streaming lifecycle
    pub open_research_id: Option<String>,
    pub last_interrupt_message_id: Option<String>,
    pub waiting_for_feedback_message_id: Option<String>,
    /// Message ids explicitly flagged as artifacts by the backend
    pub artifact_message_ids: HashSet<String>,
    pub execution_id: Option<String>,
    pub progress: Option<ProgressSnapshot>,
    pub last_event_at: Option<DateTime<Utc>>,
}

impl ThreadState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn push_message_id(&mut self, message_id: &str) {
        if !self.message_ids.iter().any(|id| id == message_id) {
            self.message_ids.push(message_id.to_string());
        }
    }

    /// Start a new research unit keyed by its opening message id
    pub fn start_research(&mut self, research_id: &str) {
        if !self.research_ids.iter().any(|id| id == research_id) {
            self.research_ids.push(research_id.to_string());
        }
        self.ongoing_research_id = Some(research_id.to_string());
    }

    /// Make sure a research key exists, synthesizing the entry if the
    /// research-start event was never seen. Reports must never be lost to
    /// incomplete upstream bookkeeping.
    pub fn ensure_research(&mut self, research_id: &str) {
        if !self.research_ids.iter().any(|id| id == research_id) {
            tracing::warn!(
                thread_id = %self.id,
                research_id,
                "Research pointer references an unknown unit; synthesizing entry"
            );
            self.research_ids.push(research_id.to_string());
        }
    }

    pub fn record_plan(&mut self, research_id: &str, message_id: &str) {
        self.ensure_research(research_id);
        self.research_plan_ids
            .insert(research_id.to_string(), message_id.to_string());
    }

    /// Record the report pointer. The report also signals the unit's
    /// completion, so a matching ongoing pointer is cleared.
    pub fn record_report(&mut self, research_id: &str, message_id: &str) {
        self.ensure_research(research_id);
        self.research_report_ids
            .insert(research_id.to_string(), message_id.to_string());
        if self.ongoing_research_id.as_deref() == Some(research_id) {
            self.ongoing_research_id = None;
        }
    }

    pub fn record_podcast(&mut self, research_id: &str, message_id: &str) {
        self.ensure_research(research_id);
        self.research_podcast_ids
            .insert(research_id.to_string(), message_id.to_string());
    }

    pub fn record_activity(&mut self, research_id: &str, message_id: &str) {
        self.ensure_research(research_id);
        let activities = self
            .research_activity_ids
            .entry(research_id.to_string())
            .or_default();
        if !activities.iter().any(|id| id == message_id) {
            activities.push(message_id.to_string());
        }
    }

    /// Which research unit, if any, a message is already indexed under
    pub fn research_of_message(&self, message_id: &str) -> Option<String> {
        if self.research_ids.iter().any(|id| id == message_id) {
            return Some(message_id.to_string());
        }
        for (rid, mid) in self
            .research_plan_ids
            .iter()
            .chain(self.research_report_ids.iter())
            .chain(self.research_podcast_ids.iter())
        {
            if mid == message_id {
                return Some(rid.clone());
            }
        }
        for (rid, activities) in &self.research_activity_ids {
            if activities.iter().any(|id| id == message_id) {
                return Some(rid.clone());
            }
        }
        None
    }

    /// Select a research unit for viewing. Unknown ids are a logged no-op.
    pub fn open_research(&mut self, research_id: &str) -> bool {
        if self.research_ids.iter().any(|id| id == research_id) {
            self.open_research_id = Some(research_id.to_string());
            true
        } else {
            tracing::warn!(
                thread_id = %self.id,
                research_id,
                "Cannot open unknown research unit"
            );
            false
        }
    }

    pub fn close_research(&mut self) {
        self.open_research_id = None;
    }

    /// A new interrupt supersedes any outstanding one; both pointers move
    /// atomically with the interrupt message's finalization
    pub fn set_interrupt(&mut self, message_id: &str) {
        self.last_interrupt_message_id = Some(message_id.to_string());
        self.waiting_for_feedback_message_id = Some(message_id.to_string());
    }

    /// Clear the outstanding interrupt once feedback has been submitted
    pub fn resolve_interrupt(&mut self) {
        self.last_interrupt_message_id = None;
        self.waiting_for_feedback_message_id = None;
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_event_at = Some(at);
    }

    /// Drop every message-derived index, keeping the thread itself alive.
    /// Used by the explicit clear-conversation (re-ask) flow.
    pub fn clear_indices(&mut self) {
        self.message_ids.clear();
        self.research_ids.clear();
        self.research_plan_ids.clear();
        self.research_report_ids.clear();
        self.research_podcast_ids.clear();
        self.research_activity_ids.clear();
        self.ongoing_research_id = None;
        self.open_research_id = None;
        self.last_interrupt_message_id = None;
        self.waiting_for_feedback_message_id = None;
        self.artifact_message_ids.clear();
        self.progress = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_deduped() {
        let mut thread = ThreadState::new("t1");
        thread.push_message_id("m1");
        thread.push_message_id("m1");
        assert_eq!(thread.message_ids, vec!["m1".to_string()]);
    }

    #[test]
    fn test_report_clears_matching_ongoing() {
        let mut thread = ThreadState::new("t1");
        thread.start_research("r1");
        thread.record_report("r1", "m7");
        assert_eq!(thread.ongoing_research_id, None);
        assert_eq!(thread.research_report_ids.get("r1").map(String::as_str), Some("m7"));
    }

    #[test]
    fn test_report_for_unknown_research_synthesized() {
        let mut thread = ThreadState::new("t1");
        thread.record_report("r9", "m9");
        assert!(thread.research_ids.iter().any(|id| id == "r9"));
        assert_eq!(thread.research_report_ids.get("r9").map(String::as_str), Some("m9"));
    }

    #[test]
    fn test_open_unknown_research_is_noop() {
        let mut thread = ThreadState::new("t1");
        assert!(!thread.open_research("r1"));
        assert_eq!(thread.open_research_id, None);

        thread.start_research("r1");
        assert!(thread.open_research("r1"));
        assert_eq!(thread.open_research_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_latest_interrupt_wins() {
        let mut thread = ThreadState::new("t1");
        thread.set_interrupt("m2");
        thread.set_interrupt("m5");
        assert_eq!(thread.waiting_for_feedback_message_id.as_deref(), Some("m5"));

        thread.resolve_interrupt();
        assert_eq!(thread.waiting_for_feedback_message_id, None);
        assert_eq!(thread.last_interrupt_message_id, None);
    }

    #[test]
    fn test_research_of_message_lookup() {
        let mut thread = ThreadState::new("t1");
        thread.start_research("r1");
        thread.record_activity("r1", "m3");
        thread.record_report("r1", "m4");

        assert_eq!(thread.research_of_message("r1").as_deref(), Some("r1"));
        assert_eq!(thread.research_of_message("m3").as_deref(), Some("r1"));
        assert_eq!(thread.research_of_message("m4").as_deref(), Some("r1"));
        assert_eq!(thread.research_of_message("m99"), None);
    }
}
