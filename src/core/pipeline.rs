use crate::core::archive::unpack_all;
use crate::core::fetch::fetch_archive;
use crate::core::frequency::WordCounter;
use crate::core::stopwords::stopword_set;
use crate::core::text::normalize_post;
use crate::core::wordcloud::layout;
use crate::core::xml_table::{find_posts_files, parse_all_xmls, read_posts, site_name};
use crate::core::{ConfigProvider, ExtractedData, Pipeline, Storage, TransformResult};
use crate::domain::model::{PostRow, WordFrequency, XmlTable};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};

pub const POSTS_CSV: &str = "posts.csv";
pub const FREQUENCY_CSV: &str = "word_frequency.csv";
pub const WORDCLOUD_SVG: &str = "wordcloud.svg";
pub const SUMMARY_JSON: &str = "run_summary.json";
const SUMMARY_TOP_WORDS: usize = 20;

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<String>,
    pub posts: usize,
    pub total_words: u64,
    pub distinct_words: usize,
    pub words_in_table: usize,
    pub words_in_cloud: usize,
    pub top_words: Vec<WordFrequency>,
    pub outputs: Vec<String>,
}

pub struct WordCloudPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> WordCloudPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

/// Synchronous half of extract: unpacking and XML reading.
/// Archives are unpacked before a configured posts file is read, since that
/// file usually lives inside one of them.
fn collect_posts(input_dir: PathBuf, posts_file: Option<PathBuf>, export_tables: bool) -> Result<ExtractedData> {
    if posts_file.is_none() || input_dir.is_dir() {
        let unpacked = unpack_all(&input_dir)?;
        tracing::debug!("{} archives available in {}", unpacked.len(), input_dir.display());
    }

    let posts_files = match posts_file {
        Some(file) => vec![file],
        None => find_posts_files(&input_dir)?,
    };

    if posts_files.is_empty() {
        return Err(EtlError::InputNotFound {
            path: input_dir.join("**").join("Posts.xml").display().to_string(),
        });
    }

    let mut data = ExtractedData::default();
    for file in &posts_files {
        let site = site_name(file);
        data.posts.extend(read_posts(file, &site)?);

        if export_tables {
            let directory = file.parent().unwrap_or(Path::new("."));
            for (_, mut table) in parse_all_xmls(directory)? {
                if !site.is_empty() {
                    table.name = format!("{}/{}", site, table.name);
                }
                data.tables.push(table);
            }
        }
    }
    data.sources = posts_files;

    Ok(data)
}

fn csv_bytes<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}

fn table_csv_bytes(table: &XmlTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in 0..table.len() {
        writer.write_record(table.columns.iter().map(|column| table.cell(row, column)))?;
    }
    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}

fn zip_bytes(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for WordCloudPipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedData> {
        let input_dir = PathBuf::from(self.config.input_dir());

        if let Some(url) = self.config.source_url() {
            fetch_archive(&self.client, url, &input_dir).await?;
        }

        let posts_file = self.config.posts_file().map(PathBuf::from);
        let export_tables = self.config.export_tables();

        tokio::task::spawn_blocking(move || collect_posts(input_dir, posts_file, export_tables))
            .await
            .map_err(|e| EtlError::ProcessingError {
                message: format!("extract task failed: {}", e),
            })?
    }

    async fn transform(&self, data: ExtractedData) -> Result<TransformResult> {
        if data.posts.is_empty() {
            tracing::warn!("No posts with a body were found; the word cloud will be empty");
        }

        let cleaned_posts: Vec<PostRow> = data
            .posts
            .into_iter()
            .map(|post| PostRow {
                body: normalize_post(&post.body),
                ..post
            })
            .collect();

        let counter: WordCounter = cleaned_posts.iter().map(|post| post.body.as_str()).collect();
        let stopwords = stopword_set(self.config.remove_stopwords(), self.config.extra_stopwords());
        let frequencies = counter.most_common(self.config.top_n(), &stopwords);

        tracing::debug!(
            "Counted {} words ({} distinct), kept {}",
            counter.total_words(),
            counter.distinct_words(),
            frequencies.len()
        );
        if !frequencies.is_empty() {
            let preview: Vec<String> = frequencies
                .iter()
                .take(10)
                .map(|f| format!("{} ({})", f.word, f.frequency))
                .collect();
            tracing::info!("🔝 Top words: {}", preview.join(", "));
        }

        Ok(TransformResult {
            cleaned_posts,
            frequencies,
            total_words: counter.total_words(),
            distinct_words: counter.distinct_words(),
            tables: data.tables,
            sources: data.sources,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let cloud = layout(&result.frequencies, &self.config.render_options());

        let mut files: Vec<(String, Vec<u8>)> = vec![
            (POSTS_CSV.to_string(), csv_bytes(&result.cleaned_posts)?),
            (FREQUENCY_CSV.to_string(), csv_bytes(&result.frequencies)?),
            (WORDCLOUD_SVG.to_string(), cloud.to_svg().into_bytes()),
        ];
        for table in &result.tables {
            files.push((format!("tables/{}.csv", table.name), table_csv_bytes(table)?));
        }

        let mut outputs: Vec<String> = files.iter().map(|(name, _)| name.clone()).collect();
        outputs.push(SUMMARY_JSON.to_string());
        let bundle = self.config.bundle_name();
        if let Some(name) = bundle {
            outputs.push(name.to_string());
        }

        let summary = RunSummary {
            generated_at: Utc::now(),
            sources: result
                .sources
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
            posts: result.cleaned_posts.len(),
            total_words: result.total_words,
            distinct_words: result.distinct_words,
            words_in_table: result.frequencies.len(),
            words_in_cloud: cloud.words.len(),
            top_words: result
                .frequencies
                .iter()
                .take(SUMMARY_TOP_WORDS)
                .cloned()
                .collect(),
            outputs,
        };
        files.push((SUMMARY_JSON.to_string(), serde_json::to_vec_pretty(&summary)?));

        for (name, data) in &files {
            tracing::debug!("Writing {} ({} bytes)", name, data.len());
            self.storage.write_file(name, data).await?;
        }

        let Some(name) = bundle else {
            return Ok(self.config.output_path().to_string());
        };

        tracing::debug!("Bundling {} files into {}", files.len(), name);
        self.storage.write_file(name, &zip_bytes(&files)?).await?;
        Ok(self.storage.location(name))
    }
}
