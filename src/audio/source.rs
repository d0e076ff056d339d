//! Where a clip comes from
//!
//! A clip can be a file on disk, an in-memory upload (with the original file
//! name's extension as a decoder hint), or samples that are already decoded.

use std::path::{Path, PathBuf};

/// File extensions accepted for upload
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "ogg"];

/// Check a file name or path against [`SUPPORTED_EXTENSIONS`] (case-insensitive)
pub fn is_supported_extension<P: AsRef<Path>>(name: P) -> bool {
    name.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Input handed to the preprocessor
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Audio file on disk
    Path(PathBuf),
    /// Encoded container bytes
    Bytes {
        data: Vec<u8>,
        /// Extension such as `"mp3"`, used only as a probing hint
        extension_hint: Option<String>,
    },
    /// Already decoded mono samples
    Samples { samples: Vec<f32>, sample_rate: u32 },
}

impl AudioSource {
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        AudioSource::Path(path.into())
    }

    /// Wrap an upload, taking the hint from the uploaded file name
    pub fn from_upload(data: Vec<u8>, file_name: &str) -> Self {
        let extension_hint = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        AudioSource::Bytes {
            data,
            extension_hint,
        }
    }

    /// Short description for log lines
    pub fn describe(&self) -> String {
        match self {
            AudioSource::Path(path) => path.display().to_string(),
            AudioSource::Bytes {
                data,
                extension_hint,
            } => format!(
                "<{} bytes, hint={}>",
                data.len(),
                extension_hint.as_deref().unwrap_or("none")
            ),
            AudioSource::Samples {
                samples,
                sample_rate,
            } => format!("<{} samples @ {} Hz>", samples.len(), sample_rate),
        }
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        AudioSource::Path(path)
    }
}

impl From<&Path> for AudioSource {
    fn from(path: &Path) -> Self {
        AudioSource::Path(path.to_path_buf())
    }
}
