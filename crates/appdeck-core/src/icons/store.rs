//! Flat on-disk icon store.
//!
//! One file per stored icon, named `<sanitized host>.<ext>` or
//! `<sanitized host>_<n>.<ext>` on collision. The file name is the only
//! identity; there is no manifest.
//!
//! Every write goes to a temporary file in the store directory first and is
//! then linked into place with a no-clobber rename, so concurrent writers for
//! the same host get distinct names and a failed write never leaves a
//! half-written icon behind.

use crate::config::PathsConfig;
use crate::{IconError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

/// Upper bound on `_n` suffixes tried before giving up.
const MAX_NAME_ATTEMPTS: usize = 10_000;

/// Replace everything but ASCII letters and digits with `_`.
pub fn sanitize_host(host: &str) -> String {
    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// File extension for a payload MIME type. Unknown types are stored as PNG.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("svg") {
        "svg"
    } else if mime.contains("webp") {
        "webp"
    } else if mime.contains("jpeg") || mime.contains("jpg") {
        "jpg"
    } else if mime.contains("png") {
        "png"
    } else if mime.contains("icon") || mime.contains("ico") {
        "ico"
    } else {
        "png"
    }
}

/// Split a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| IconError::InvalidDataUrl {
            message: "missing 'data:' prefix".to_string(),
        })?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| IconError::InvalidDataUrl {
        message: "missing ',' separator".to_string(),
    })?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| IconError::InvalidDataUrl {
            message: "only base64 data URLs are supported".to_string(),
        })?;
    let bytes = decode_base64(payload)?;
    Ok((mime.to_string(), bytes))
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(data.trim())
        .map_err(|e| IconError::InvalidDataUrl {
            message: format!("invalid base64 payload: {}", e),
        })
}

fn file_name(stem: &str, counter: usize, ext: &str) -> String {
    if counter == 0 {
        format!("{}.{}", stem, ext)
    } else {
        format!("{}_{}.{}", stem, counter, ext)
    }
}

/// Reject anything that is not a bare file name.
fn validate_file_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(IconError::InvalidParams {
            message: format!("invalid icon file name '{}'", name),
        });
    }
    Ok(())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PathsConfig::IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Directory of stored icons.
#[derive(Debug, Clone)]
pub struct IconStore {
    dir: PathBuf,
}

impl IconStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file_name: &str) -> Result<PathBuf> {
        validate_file_name(file_name)?;
        Ok(self.dir.join(file_name))
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| IconError::io_with_path(e, &self.dir))
    }

    /// Commit a chosen payload for `target_url`. Returns the stored name.
    pub fn persist(&self, bytes: &[u8], mime_type: &str, target_url: &str) -> Result<String> {
        let target = Url::parse(target_url.trim())
            .map_err(|e| IconError::invalid_url(target_url, e.to_string()))?;
        let host = target
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| IconError::invalid_url(target_url, "missing host"))?;

        let name = self.write_unique(&sanitize_host(host), extension_for_mime(mime_type), bytes)?;
        info!("Stored icon for {} as {}", host, name);
        Ok(name)
    }

    /// Commit a `data:` URL preview as returned to the frontend.
    pub fn persist_data_url(&self, data_url: &str, target_url: &str) -> Result<String> {
        let (mime, bytes) = decode_data_url(data_url)?;
        self.persist(&bytes, &mime, target_url)
    }

    /// Stored icon names, sorted. Creates the directory if needed.
    pub fn list_icons(&self) -> Result<Vec<String>> {
        self.ensure_dir()?;
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| IconError::io_with_path(e, &self.dir))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IconError::io_with_path(e, &self.dir))?;
            let path = entry.path();
            if !path.is_file() || !is_image_file(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete_icon(&self, file_name: &str) -> Result<()> {
        let path = self.path_of(file_name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted icon {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(IconError::IconNotFound {
                name: file_name.to_string(),
            }),
            Err(e) => Err(IconError::io_with_path(e, path)),
        }
    }

    /// Copy an external image into the store, keeping its stem.
    pub fn import_icon(&self, source: &Path) -> Result<String> {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| PathsConfig::IMAGE_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| IconError::InvalidParams {
                message: format!("{} is not a supported image file", source.display()),
            })?;
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IconError::InvalidParams {
                message: format!("{} has no usable file name", source.display()),
            })?;

        let bytes = std::fs::read(source).map_err(|e| IconError::io_with_path(e, source))?;
        let name = self.write_unique(stem, &ext, &bytes)?;
        info!("Imported {} as {}", source.display(), name);
        Ok(name)
    }

    /// Write `bytes` under the first free `<stem>[_n].<ext>` name.
    fn write_unique(&self, stem: &str, ext: &str, bytes: &[u8]) -> Result<String> {
        self.ensure_dir()?;

        let mut temp =
            NamedTempFile::new_in(&self.dir).map_err(|e| IconError::io_with_path(e, &self.dir))?;
        temp.write_all(bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| IconError::io_with_path(e, temp.path()))?;

        for counter in 0..MAX_NAME_ATTEMPTS {
            let name = file_name(stem, counter, ext);
            let dest = self.dir.join(&name);
            match temp.persist_noclobber(&dest) {
                Ok(_) => return Ok(name),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} exists, trying next suffix", name);
                    temp = e.file;
                }
                Err(e) => return Err(IconError::io_with_path(e.error, dest)),
            }
        }

        Err(IconError::Other(format!(
            "no free file name for '{}.{}' after {} attempts",
            stem, ext, MAX_NAME_ATTEMPTS
        )))
    }
}
