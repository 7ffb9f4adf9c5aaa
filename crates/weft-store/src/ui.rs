use weft_types::InterruptOption;

/// Ephemeral per-thread view state. Never persisted; rebuilt from defaults
/// on reload.
#[derive(Debug, Clone)]
pub struct UiState {
    pub report_panel_open: bool,
    pub activity_panel_open: bool,
    pub podcast_panel_open: bool,
    /// Single-slot pending feedback selection; setting while one is pending
    /// overwrites it
    pub pending_feedback: Option<InterruptOption>,
    pub focused_url_param: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            report_panel_open: true,
            activity_panel_open: true,
            podcast_panel_open: true,
            pending_feedback: None,
            focused_url_param: None,
        }
    }
}

impl UiState {
    pub fn set_feedback(&mut self, option: InterruptOption) {
        self.pending_feedback = Some(option);
    }

    pub fn remove_feedback(&mut self) -> Option<InterruptOption> {
        self.pending_feedback.take()
    }

    pub fn toggle_report_panel(&mut self) {
        self.report_panel_open = !self.report_panel_open;
    }

    pub fn toggle_activity_panel(&mut self) {
        self.activity_panel_open = !self.activity_panel_open;
    }

    pub fn toggle_podcast_panel(&mut self) {
        self.podcast_panel_open = !self.podcast_panel_open;
    }

    /// Layout rule computed downstream of the independent flags
    pub fn double_panel_layout(&self) -> bool {
        self.report_panel_open && self.activity_panel_open
    }
}
