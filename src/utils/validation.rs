use crate::domain::model::RenderOptions;
use crate::utils::error::{EtlError, Result};
use url::Url;

pub const ARCHIVE_EXTENSIONS: &[&str] = &["7z", "zip"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_source_url(field_name: &str, url_str: &str) -> Result<()> {
    let invalid = |reason: String| EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason,
    };

    if url_str.is_empty() {
        return Err(invalid("URL cannot be empty".to_string()));
    }

    let url = Url::parse(url_str).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("Unsupported URL scheme: {}", scheme))),
    }

    let file_name = url
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or_default();
    validate_archive_name(field_name, file_name)
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// Unordered values such as a float NaN fail the check.
pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if !(value >= min && value <= max) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_render_options(options: &RenderOptions) -> Result<()> {
    validate_range("render.width", options.width, 100, 8000)?;
    validate_range("render.height", options.height, 100, 8000)?;
    validate_range("render.min_font", options.min_font, 1.0, 500.0)?;
    validate_range("render.max_font", options.max_font, options.min_font, 500.0)?;
    validate_positive_number("render.max_words", options.max_words, 1)?;
    if options.background.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: "render.background".to_string(),
            value: options.background.clone(),
            reason: "Background colour cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Accepts names ending in one of [`ARCHIVE_EXTENSIONS`], case-insensitively.
pub fn validate_archive_name(field_name: &str, name: &str) -> Result<()> {
    let extension = std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ARCHIVE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: format!(
                "Unsupported archive extension: {}. Allowed extensions: {}",
                ext,
                ARCHIVE_EXTENSIONS.join(", ")
            ),
        }),
        None => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}
