use crate::config::DEFAULT_BUNDLE_NAME;
use crate::core::ConfigProvider;
use crate::domain::model::RenderOptions;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

const DEFAULT_TOP_N: usize = 200;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub transform: TransformConfig,
    pub render: Option<RenderConfig>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_dir: String,
    pub posts_file: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    pub top_n: Option<usize>,
    pub remove_stopwords: Option<bool>,
    pub extra_stopwords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Option<String>,
    pub min_font: Option<f32>,
    pub max_font: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub export_tables: Option<bool>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub verbose: Option<bool>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a config after replacing `${VAR}` with environment values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("source.input_dir", &self.source.input_dir)?;
        if let Some(posts_file) = &self.source.posts_file {
            validation::validate_path("source.posts_file", posts_file)?;
        }
        if let Some(url) = &self.source.url {
            validation::validate_source_url("source.url", url)?;
        }
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_positive_number("transform.top_n", self.top_n(), 1)?;

        if let Some(compression) = &self.load.compression {
            if let Some(filename) = &compression.filename {
                if !filename.to_ascii_lowercase().ends_with(".zip") {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "load.compression.filename".to_string(),
                        value: filename.clone(),
                        reason: "Bundle file name must end in .zip".to_string(),
                    });
                }
            }
        }

        validation::validate_render_options(&self.render_options())
    }

    pub fn top_n(&self) -> usize {
        self.transform.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn verbose_logging(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_dir(&self) -> &str {
        &self.source.input_dir
    }

    fn posts_file(&self) -> Option<&str> {
        self.source.posts_file.as_deref()
    }

    fn source_url(&self) -> Option<&str> {
        self.source.url.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn top_n(&self) -> usize {
        TomlConfig::top_n(self)
    }

    fn remove_stopwords(&self) -> bool {
        self.transform.remove_stopwords.unwrap_or(true)
    }

    fn extra_stopwords(&self) -> &[String] {
        self.transform.extra_stopwords.as_deref().unwrap_or(&[])
    }

    fn export_tables(&self) -> bool {
        self.load.export_tables.unwrap_or(false)
    }

    fn bundle_name(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_deref().unwrap_or(DEFAULT_BUNDLE_NAME))
    }

    fn render_options(&self) -> RenderOptions {
        let defaults = RenderOptions::default();
        let Some(render) = &self.render else {
            return RenderOptions {
                max_words: self.top_n(),
                ..defaults
            };
        };

        RenderOptions {
            width: render.width.unwrap_or(defaults.width),
            height: render.height.unwrap_or(defaults.height),
            background: render.background.clone().unwrap_or(defaults.background),
            min_font: render.min_font.unwrap_or(defaults.min_font),
            max_font: render.max_font.unwrap_or(defaults.max_font),
            max_words: self.top_n(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
