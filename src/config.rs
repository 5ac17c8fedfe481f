use crate::core::models::{CodeSettings, EvalTreatment};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "bundlemap.config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    #[serde(default = "default_application_path")]
    pub application_path: String,
    #[serde(default)]
    pub line_ending: LineEnding,
    #[serde(default)]
    pub eval_treatment: EvalTreatment,
    #[serde(default)]
    pub preserve_important_comments: bool,
    #[serde(default = "default_true")]
    pub term_semicolons: bool,
    #[serde(default = "default_true")]
    pub mangle: bool,
    #[serde(default = "default_true")]
    pub include_sources_content: bool,
}

fn default_application_path() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            application_path: default_application_path(),
            line_ending: LineEnding::Lf,
            eval_treatment: EvalTreatment::MakeImmediateSafe,
            preserve_important_comments: false,
            term_semicolons: true,
            mangle: true,
            include_sources_content: true,
        }
    }
}

impl BundlerConfig {
    /// Load `path`, or `bundlemap.config.json` in `root` when present, else defaults
    pub fn load(path: Option<&Path>, root: &Path) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => root.join(CONFIG_FILE_NAME),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
        Ok(config)
    }

    pub fn code_settings(&self) -> CodeSettings {
        CodeSettings {
            eval_treatment: self.eval_treatment,
            preserve_important_comments: self.preserve_important_comments,
            term_semicolons: self.term_semicolons,
            mangle: self.mangle,
            include_sources_content: self.include_sources_content,
        }
    }
}
