//! Media type resolution for files on disk.

use std::path::Path;

/// Media type to fall back to when neither content nor extension is recognized.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Resolve a file's media type from its leading bytes, then its extension.
///
/// Content sniffing wins over the extension: uploads are frequently
/// misnamed, and a PDF saved as `.docx` should still be treated as a PDF.
pub fn resolve_media_type(path: &Path, content: &[u8]) -> String {
    if let Some(kind) = infer::get(content) {
        // infer reports every OOXML container as zip unless it can see the
        // content types part; fall through to the extension in that case.
        if kind.mime_type() != "application/zip" {
            return kind.mime_type().to_string();
        }
    }

    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| UNKNOWN_MIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniffs_pdf_regardless_of_extension() {
        let mime = resolve_media_type(Path::new("report.txt"), b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n");
        assert_eq!(mime, "application/pdf");
    }

    #[test]
    fn test_sniffs_png() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
        assert_eq!(resolve_media_type(Path::new("scan"), &png_header), "image/png");
    }

    #[test]
    fn test_falls_back_to_extension() {
        let mime = resolve_media_type(Path::new("letter.docx"), b"PK\x03\x04");
        assert_eq!(
            mime,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(
            resolve_media_type(Path::new("blob"), b"\x00\x01"),
            "application/octet-stream"
        );
    }
}
