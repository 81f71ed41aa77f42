pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::RenderOptions;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_BUNDLE_NAME: &str = "wordcloud_output.zip";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "stack-wordcloud")]
#[command(about = "Word cloud of the most frequent words in Stack Exchange posts")]
pub struct CliConfig {
    /// Directory with dump archives (.7z/.zip) or extracted dump directories
    #[arg(long, default_value = "./7zdatabase")]
    pub input_dir: String,

    /// Use this Posts.xml instead of searching the input directory
    #[arg(long)]
    pub posts_file: Option<String>,

    /// Download the dump archive from this URL into the input directory first
    #[arg(long)]
    pub source_url: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Number of most frequent words to keep
    #[arg(long, default_value = "200")]
    pub top_n: usize,

    /// Do not remove the built-in English stopwords
    #[arg(long)]
    pub keep_stopwords: bool,

    #[arg(long, value_delimiter = ',')]
    pub extra_stopwords: Vec<String>,

    /// Also write every XML file of the dump as a CSV table
    #[arg(long)]
    pub export_tables: bool,

    /// Bundle all outputs into a zip file
    #[arg(long)]
    pub bundle: bool,

    #[arg(long, default_value = "800")]
    pub width: u32,

    #[arg(long, default_value = "400")]
    pub height: u32,

    #[arg(long, default_value = "white")]
    pub background: String,

    /// Font size of the least frequent word
    #[arg(long, default_value = "8")]
    pub min_font: f32,

    /// Font size of the most frequent word
    #[arg(long, default_value = "96")]
    pub max_font: f32,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log per-phase CPU and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_dir(&self) -> &str {
        &self.input_dir
    }

    fn posts_file(&self) -> Option<&str> {
        self.posts_file.as_deref()
    }

    fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn top_n(&self) -> usize {
        self.top_n
    }

    fn remove_stopwords(&self) -> bool {
        !self.keep_stopwords
    }

    fn extra_stopwords(&self) -> &[String] {
        &self.extra_stopwords
    }

    fn export_tables(&self) -> bool {
        self.export_tables
    }

    fn bundle_name(&self) -> Option<&str> {
        self.bundle.then_some(DEFAULT_BUNDLE_NAME)
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
            background: self.background.clone(),
            min_font: self.min_font,
            max_font: self.max_font,
            max_words: self.top_n,
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input_dir", &self.input_dir)?;
        if let Some(posts_file) = &self.posts_file {
            validation::validate_path("posts_file", posts_file)?;
        }
        if let Some(url) = &self.source_url {
            validation::validate_source_url("source_url", url)?;
        }
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_positive_number("top_n", self.top_n, 1)?;
        validation::validate_render_options(&self.render_options())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["stack-wordcloud"]);

        assert_eq!(config.input_dir(), "./7zdatabase");
        assert_eq!(config.top_n(), 200);
        assert!(config.remove_stopwords());
        assert_eq!(config.bundle_name(), None);
        assert_eq!(config.render_options(), RenderOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_flags() {
        let config = CliConfig::parse_from([
            "stack-wordcloud",
            "--posts-file",
            "dumps/hinduism.stackexchange.com/Posts.xml",
            "--top-n",
            "50",
            "--keep-stopwords",
            "--extra-stopwords",
            "god,krishna",
            "--bundle",
            "--width",
            "1200",
            "--min-font",
            "12",
            "--max-font",
            "64",
        ]);

        assert_eq!(config.posts_file(), Some("dumps/hinduism.stackexchange.com/Posts.xml"));
        assert!(!config.remove_stopwords());
        assert_eq!(config.extra_stopwords(), ["god", "krishna"]);
        assert_eq!(config.bundle_name(), Some(DEFAULT_BUNDLE_NAME));
        assert_eq!(config.render_options().width, 1200);
        assert_eq!(config.render_options().max_words, 50);
        assert_eq!(config.render_options().min_font, 12.0);
        assert_eq!(config.render_options().max_font, 64.0);
    }

    #[test]
    fn test_cli_validation_rejects_bad_values() {
        let zero = CliConfig::parse_from(["stack-wordcloud", "--top-n", "0"]);
        assert!(zero.validate().is_err());

        let url = CliConfig::parse_from(["stack-wordcloud", "--source-url", "ftp://x/dump.7z"]);
        assert!(url.validate().is_err());

        let tiny = CliConfig::parse_from(["stack-wordcloud", "--height", "10"]);
        assert!(tiny.validate().is_err());

        let nan_font = CliConfig::parse_from(["stack-wordcloud", "--min-font", "NaN"]);
        assert!(nan_font.validate().is_err());
    }
}
