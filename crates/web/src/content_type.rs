//! File extension to content type lookup for served resources.

use mime::Mime;

/// Maps file extensions to content types.
pub trait MimeLookup: Send + Sync {
    /// Content type for an extension without the leading dot, if known.
    fn content_type_for(&self, extension: &str) -> Option<Mime>;

    /// Whether the path ends in an extension this lookup knows.
    fn is_recognized(&self, path: &str) -> bool {
        extension_of(path).and_then(|extension| self.content_type_for(extension)).is_some()
    }
}

/// The built-in extension table, matched case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionTable;

impl MimeLookup for ExtensionTable {
    fn content_type_for(&self, extension: &str) -> Option<Mime> {
        let mime = match extension.to_ascii_lowercase().as_str() {
            "html" | "htm" => mime::TEXT_HTML_UTF_8,
            "css" => mime::TEXT_CSS_UTF_8,
            "js" | "mjs" => mime::TEXT_JAVASCRIPT,
            "json" => mime::APPLICATION_JSON,
            "txt" | "log" => mime::TEXT_PLAIN_UTF_8,
            "xml" => mime::TEXT_XML,
            "csv" => mime::TEXT_CSV_UTF_8,
            "png" => mime::IMAGE_PNG,
            "jpg" | "jpeg" => mime::IMAGE_JPEG,
            "gif" => mime::IMAGE_GIF,
            "bmp" => mime::IMAGE_BMP,
            "svg" => mime::IMAGE_SVG,
            "pdf" => mime::APPLICATION_PDF,
            "woff" => mime::FONT_WOFF,
            "woff2" => mime::FONT_WOFF2,
            "ico" => return "image/x-icon".parse().ok(),
            "wasm" => return "application/wasm".parse().ok(),
            "zip" => return "application/zip".parse().ok(),
            "mp3" => return "audio/mpeg".parse().ok(),
            "mp4" => return "video/mp4".parse().ok(),
            _ => return None,
        };
        Some(mime)
    }
}

/// The extension of the last path segment, without the dot.
pub fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next()?;
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => Some(extension),
        _ => None,
    }
}
