use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_source_url;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Downloads a dump archive into `directory`, named after the last URL path segment.
pub async fn fetch_archive(client: &Client, url: &str, directory: &Path) -> Result<PathBuf> {
    validate_source_url("source.url", url)?;
    let file_name = Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|s| s.last()).map(str::to_string))
        .ok_or_else(|| EtlError::InvalidConfigValueError {
            field: "source.url".to_string(),
            value: url.to_string(),
            reason: "URL has no file name".to_string(),
        })?;

    tracing::info!("⬇️  Downloading {}", url);
    let response = client.get(url).send().await?;
    tracing::debug!("Download response status: {}", response.status());

    if !response.status().is_success() {
        return Err(EtlError::HttpStatusError {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    tokio::fs::create_dir_all(directory).await?;
    let target = directory.join(&file_name);
    let partial = directory.join(format!("{}.part", file_name));

    match stream_to_file(response, &partial).await {
        Ok(written) => {
            tokio::fs::rename(&partial, &target).await?;
            tracing::info!("Saved {} bytes to {}", written, target.display());
            Ok(target)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                tracing::warn!("Could not remove {}: {}", partial.display(), cleanup);
            }
            Err(e)
        }
    }
}

/// Writes the body chunk by chunk so a dump never has to fit in memory.
async fn stream_to_file(mut response: Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
