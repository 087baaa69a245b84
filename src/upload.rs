use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Extensions accepted by the upload form, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("No image file selected")]
    NoFile,

    #[error("Invalid file type. Allowed types: png, jpg, jpeg, gif")]
    DisallowedType,
}

/// Extension after the last `.`, if any.
fn extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn allowed_file(filename: &str) -> bool {
    extension(filename)
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Reduces a client-supplied filename to a flat ASCII name.
///
/// Path separators turn into spaces, whitespace runs collapse to `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.` and `_` are
/// stripped, so the result can never escape the upload directory.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

/// Validates a client filename and derives the opaque name it is stored under:
/// a random token plus the original (case-preserved) extension.
pub fn stored_filename(client_filename: Option<&str>) -> Result<String, UploadRejection> {
    let client_filename = match client_filename {
        Some(name) if !name.is_empty() => name,
        _ => return Err(UploadRejection::NoFile),
    };
    if !allowed_file(client_filename) {
        return Err(UploadRejection::DisallowedType);
    }

    // Sanitizing can eat the extension (e.g. a non-ASCII stem); re-check.
    let sanitized = secure_filename(client_filename);
    let ext = match extension(&sanitized) {
        Some(ext) if allowed_file(&sanitized) => ext,
        _ => return Err(UploadRejection::DisallowedType),
    };

    Ok(format!("{}.{}", uuid::Uuid::new_v4().simple(), ext))
}

/// Local-disk store for uploaded images.
///
/// Each image is a single flat file at `{dir}/{filename}`.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub async fn new(dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Path for a stored filename, or `None` if the name could leave the directory.
    pub fn file_path(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty() || filename != secure_filename(filename) {
            return None;
        }
        Some(self.dir.join(filename))
    }

    pub async fn save(&self, filename: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.file_path(filename).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unsafe upload filename: {}", filename),
            )
        })?;
        fs::write(&path, data).await?;
        info!("Stored upload {} ({} bytes)", filename, data.len());
        Ok(path)
    }

    pub async fn read(&self, filename: &str) -> Option<Vec<u8>> {
        let path = self.file_path(filename)?;
        fs::read(path).await.ok()
    }

    pub async fn remove(&self, filename: &str) -> std::io::Result<()> {
        match self.file_path(filename) {
            Some(path) => fs::remove_file(path).await,
            None => Ok(()),
        }
    }

    /// Public URL an image is served from.
    pub fn public_url(filename: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, filename)
    }
}
