//! MIME type detection for linked images.
//!
//! Used when a server answers without a `Content-Type` header: the URL's file
//! extension is the only remaining hint.

use std::path::Path;

/// Image MIME type implied by a path's extension, if any.
pub fn detect_image_mime(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "svg"          => "image/svg+xml",
        "avif"         => "image/avif",
        "bmp"          => "image/bmp",
        "ico"          => "image/x-icon",
        "tiff" | "tif" => "image/tiff",
        _              => return None,
    };
    Some(mime)
}

/// Image MIME type implied by a URL's path, ignoring query and fragment.
pub fn mime_from_url(url: &reqwest::Url) -> Option<&'static str> {
    detect_image_mime(Path::new(url.path()))
}

/// Whether a `Content-Type` value names an image. Parameters are ignored.
pub fn is_image(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_jpeg() {
        assert_eq!(detect_image_mime(&PathBuf::from("photo.JPG")), Some("image/jpeg"));
    }

    #[test]
    fn non_images_have_no_mime() {
        assert_eq!(detect_image_mime(&PathBuf::from("speech.mp3")), None);
        assert_eq!(detect_image_mime(&PathBuf::from("README")), None);
    }

    #[test]
    fn url_query_is_ignored() {
        let url = reqwest::Url::parse("https://cdn.example/quests/mouse.png?size=256#top").unwrap();
        assert_eq!(mime_from_url(&url), Some("image/png"));
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert!(is_image("image/png"));
        assert!(is_image("Image/GIF; charset=binary"));
        assert!(!is_image("text/html; charset=utf-8"));
    }
}
