//! Image intake for ScanChat: artifacts, display URIs and MIME detection.

pub mod artifact;
pub mod display;
pub mod mime_detect;

pub use artifact::{split_data_uri, ImageArtifact};
pub use display::{DisplayHandle, DisplayRegistry};
pub use mime_detect::{detect_mime_type, is_image, sniff_mime_type};
