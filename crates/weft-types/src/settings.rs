use serde::{Deserialize, Serialize};

/// Writing style of the final report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStyle {
    Academic,
    PopularScience,
    News,
    SocialMedia,
}

impl Default for ReportStyle {
    fn default() -> Self {
        ReportStyle::Academic
    }
}

/// Research pipeline knobs sent with the initial ask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    pub enable_background_investigation: bool,
    pub report_style: ReportStyle,
    pub enable_deep_thinking: bool,
    pub max_research_depth: u8,
    pub enable_web_search: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            enable_background_investigation: true,
            report_style: ReportStyle::default(),
            enable_deep_thinking: false,
            max_research_depth: 3,
            enable_web_search: true,
        }
    }
}

/// Model selection passed through to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub provider: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "claude-3-5-sonnet".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            top_p: 0.9,
            provider: "anthropic".to_string(),
        }
    }
}

/// Output shaping preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub language: String,
    pub output_format: String,
    pub include_citations: bool,
    pub include_artifacts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            language: "enUS".to_string(),
            output_format: "markdown".to_string(),
            include_citations: true,
            include_artifacts: true,
        }
    }
}

/// Bundle sent as the `config` object of ask/stream requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchSettings {
    #[serde(default)]
    pub research_config: ResearchConfig,
    #[serde(default)]
    pub model_config: ModelConfig,
    #[serde(default)]
    pub output_config: OutputConfig,
}
