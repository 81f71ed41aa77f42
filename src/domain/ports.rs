use crate::domain::model::{ExtractedData, RenderOptions, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human-readable location of `path`, used in reports.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    /// Directory holding dump archives and/or extracted dump directories.
    fn input_dir(&self) -> &str;
    /// Explicit Posts.xml; when absent the input directory is searched.
    fn posts_file(&self) -> Option<&str>;
    fn source_url(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn top_n(&self) -> usize;
    fn remove_stopwords(&self) -> bool;
    fn extra_stopwords(&self) -> &[String];
    fn export_tables(&self) -> bool;
    /// Zip file name for bundling all outputs, if bundling is on.
    fn bundle_name(&self) -> Option<&str>;
    fn render_options(&self) -> RenderOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedData>;
    async fn transform(&self, data: ExtractedData) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
