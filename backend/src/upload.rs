use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Lowercased extension of `filename` when it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Reduces a client-supplied name to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// An uploaded file on disk, removed when dropped unless [`TempUpload::keep`] is called.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    file_name: String,
    armed: bool,
}

impl TempUpload {
    /// Writes `bytes` to `<dir>/<uuid>_<sanitized name>`.
    pub fn persist(dir: &Path, original_name: &str, bytes: &[u8]) -> io::Result<Self> {
        let mut safe_name = sanitize_filename(original_name);
        if allowed_extension(&safe_name).is_none() {
            let extension = allowed_extension(original_name).unwrap_or_else(|| "bin".into());
            safe_name = format!("upload.{}", extension);
        }
        let file_name = format!("{}_{}", Uuid::new_v4(), safe_name);
        let path = dir.join(&file_name);

        let upload = Self {
            path,
            file_name,
            armed: true,
        };
        std::fs::write(&upload.path, bytes)?;
        log::info!("Saved upload {} ({} bytes)", upload.file_name, bytes.len());
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Leaves the file in place and returns its generated name.
    pub fn keep(mut self) -> String {
        self.armed = false;
        std::mem::take(&mut self.file_name)
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed upload {}", self.file_name),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove upload {}: {}", self.path.display(), e),
        }
    }
}
