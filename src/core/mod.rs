pub mod archive;
pub mod etl;
pub mod fetch;
pub mod frequency;
pub mod pipeline;
pub mod stopwords;
pub mod text;
pub mod wordcloud;
pub mod xml_table;

pub use crate::domain::model::{ExtractedData, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
