//! Link probing for the image-link argument type.

pub mod mime_detect;
pub mod probe;

pub use mime_detect::{detect_image_mime, is_image, mime_from_url};
pub use probe::HttpImageProbe;
