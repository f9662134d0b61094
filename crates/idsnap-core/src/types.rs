use std::path::Path;

/// MIME type used when neither the file name nor the content identify the format.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A user-supplied file: raw bytes plus the metadata the picker or drop reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub name: String,
    /// Declared MIME type (e.g., "image/jpeg").
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl MediaAsset {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, deriving its MIME type the way a browser would
    /// for a picked file: extension first, then content sniffing.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = detect_mime(path, &bytes);
        Ok(Self { name, mime, bytes })
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the declared MIME type is an image type.
    pub fn is_image(&self) -> bool {
        self.mime.to_ascii_lowercase().starts_with("image/")
    }

    /// Lowercased file extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

fn detect_mime(path: &Path, bytes: &[u8]) -> String {
    if let Ok(format) = image::ImageFormat::from_path(path) {
        return format.to_mime_type().to_string();
    }
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => OCTET_STREAM.to_string(),
    }
}

/// Identity returned by the recognition service for a matched face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    /// Free-text information stored with the person (may be empty).
    pub info: String,
}

/// The service's copy of the probe image with facial landmarks drawn on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}
