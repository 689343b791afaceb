//! MIME type detection for incoming images.
//!
//! Clipboard pastes carry no file name, so content sniffing comes first and
//! the extension is only a fallback.

use std::path::Path;

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "avif"         => "image/avif",
        "ico"          => "image/x-icon",
        "svg"          => "image/svg+xml",
        "pdf"          => "application/pdf",
        "txt"          => "text/plain",
        _              => "application/octet-stream",
    }
}

/// Detect MIME type from magic bytes, if the payload is a known image format.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn detects_jpeg_extension() {
        assert_eq!(detect_mime_type(&PathBuf::from("scan.JPG")), "image/jpeg");
    }

    #[test]
    fn unknown_extension_fallback() {
        assert_eq!(detect_mime_type(&PathBuf::from("file.xyz")), "application/octet-stream");
    }

    #[test]
    fn sniffs_png_magic() {
        assert_eq!(sniff_mime_type(PNG_MAGIC), Some("image/png"));
        assert_eq!(sniff_mime_type(b"plain text"), None);
    }

    #[test]
    fn image_prefix_check() {
        assert!(is_image("image/webp"));
        assert!(!is_image("application/pdf"));
    }
}
