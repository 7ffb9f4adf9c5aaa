use weft_types::ResearchSettings;

/// Client configuration: where the research backend lives and the defaults
/// attached to every ask
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub locale: String,
    pub settings: ResearchSettings,
    /// Questions longer than this are rejected before any network call
    pub max_question_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            locale: "en-US".to_string(),
            settings: ResearchSettings::default(),
            max_question_len: 2000,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_settings(mut self, settings: ResearchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_question_len(mut self, len: usize) -> Self {
        self.max_question_len = len;
        self
    }

    pub(crate) fn ask_url(&self) -> String {
        format!("{}/api/research/ask", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn stream_url(&self) -> String {
        format!("{}/api/chat/stream", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn workspace_url(&self, url_param: &str) -> String {
        format!(
            "{}/api/research/workspace/{}",
            self.base_url.trim_end_matches('/'),
            url_param
        )
    }
}
