use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_archive_name, ARCHIVE_EXTENSIONS};
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

/// Written into a destination once every entry has been extracted.
pub const UNPACKED_MARKER: &str = ".unpacked";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedArchive {
    pub archive: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    SevenZ,
    Zip,
}

fn archive_kind(path: &Path) -> Option<ArchiveKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "7z" => Some(ArchiveKind::SevenZ),
        "zip" => Some(ArchiveKind::Zip),
        _ => None,
    }
}

/// `dumps/site.stackexchange.com.7z` unpacks into `dumps/site.stackexchange.com`.
pub fn default_destination(archive: &Path) -> PathBuf {
    archive.with_extension("")
}

/// Unpacks a `.7z` or `.zip` archive and returns the directory it was unpacked into.
/// The destination defaults to the archive path without its extension and is
/// created when missing. Entries that would land outside it are refused.
pub fn unpack_archive(archive: &Path, destination: Option<&Path>) -> Result<PathBuf> {
    let name = archive.to_string_lossy();
    let Some(kind) = archive_kind(archive) else {
        validate_archive_name("archive", &name)?;
        return Err(EtlError::ProcessingError {
            message: format!("Unsupported archive: {}", name),
        });
    };
    if !archive.is_file() {
        return Err(EtlError::InputNotFound {
            path: name.into_owned(),
        });
    }

    let destination = destination
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_destination(archive));
    fs::create_dir_all(&destination)?;

    tracing::info!("📦 Unpacking {} into {}", archive.display(), destination.display());

    match kind {
        ArchiveKind::SevenZ => {
            let mut rejected = None;
            let extracted = sevenz_rust::decompress_file_with_extract_fn(archive, &destination, |entry, reader, path| {
                if !is_contained(entry.name()) {
                    rejected = Some(entry.name().to_string());
                    return Ok(false);
                }
                sevenz_rust::default_entry_extract_fn(entry, reader, path)
            });

            if let Some(entry) = rejected {
                return Err(EtlError::SevenZError {
                    archive: name.to_string(),
                    message: format!("entry '{}' would be written outside {}", entry, destination.display()),
                });
            }
            extracted.map_err(|e| EtlError::SevenZError {
                archive: name.to_string(),
                message: e.to_string(),
            })?;
        }
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
            tracing::debug!("{} entries in {}", zip.len(), archive.display());
            zip.extract(&destination)?;
        }
    }

    fs::write(destination.join(UNPACKED_MARKER), b"")?;
    Ok(destination)
}

/// Relative paths that stay below the directory they are joined to.
fn is_contained(entry_name: &str) -> bool {
    Path::new(entry_name)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn is_unpacked(directory: &Path) -> bool {
    directory.join(UNPACKED_MARKER).is_file()
}

/// Unpacks every archive directly inside `directory`, in file name order.
/// Archives whose default destination holds a finished extraction are not
/// unpacked again; an interrupted one is redone.
pub fn unpack_all(directory: &Path) -> Result<Vec<UnpackedArchive>> {
    if !directory.is_dir() {
        return Err(EtlError::InputNotFound {
            path: directory.display().to_string(),
        });
    }

    let mut archives: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && archive_kind(path).is_some())
        .collect();
    archives.sort();

    if archives.is_empty() {
        tracing::debug!(
            "No {} archives in {}",
            ARCHIVE_EXTENSIONS.join("/"),
            directory.display()
        );
    }

    archives
        .into_iter()
        .map(|archive| {
            let existing = default_destination(&archive);
            let destination = if is_unpacked(&existing) {
                tracing::info!("⏭️  {} already unpacked", existing.display());
                existing
            } else {
                unpack_archive(&archive, None)?
            };
            Ok(UnpackedArchive {
                archive,
                destination,
            })
        })
        .collect()
}
