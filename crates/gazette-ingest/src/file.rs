//! Upload classification: extension allow-list cross-checked with a magic-byte sniff.

use std::io::Read;
use std::path::Path;

use gazette_core::{Error, Result};
use gazette_recognize::DocumentKind;

/// Extensions accepted for ingestion.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "tif", "tiff"];

/// Outcome of classifying an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: DocumentKind,
    /// Set when extension and content disagree; processing still proceeds.
    pub warning: Option<String>,
}

/// Detect a document kind from its leading bytes.
pub fn sniff(header: &[u8]) -> Option<DocumentKind> {
    if header.starts_with(b"%PDF") {
        Some(DocumentKind::Pdf)
    } else if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(DocumentKind::Jpeg)
    } else if header.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(DocumentKind::Png)
    } else if header.starts_with(b"II*\0") || header.starts_with(b"MM\0*") {
        Some(DocumentKind::Tiff)
    } else {
        None
    }
}

/// Classify a saved upload.
///
/// Rejects missing and empty files, and files whose extension is not
/// allow-listed unless their content is recognizable.
pub fn classify(path: &Path) -> Result<Classification> {
    let meta = std::fs::metadata(path)
        .map_err(|_| Error::Input(format!("file does not exist: {}", path.display())))?;
    if meta.len() == 0 {
        return Err(Error::Input(format!("file is empty: {}", path.display())));
    }

    let mut header = Vec::with_capacity(8);
    std::fs::File::open(path)?
        .take(8)
        .read_to_end(&mut header)?;
    let sniffed = sniff(&header);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match (DocumentKind::from_extension(&ext), sniffed) {
        (Some(kind), Some(found)) if kind == found => Ok(Classification {
            kind,
            warning: None,
        }),
        (Some(kind), Some(found)) => Ok(Classification {
            kind,
            warning: Some(format!(
                "extension .{} says {} but content looks like {}",
                ext, kind, found
            )),
        }),
        (Some(kind), None) => Ok(Classification {
            kind,
            warning: Some(format!(
                "content of .{} file does not carry a {} signature",
                ext, kind
            )),
        }),
        (None, Some(found)) => Ok(Classification {
            kind: found,
            warning: Some(format!(
                "unsupported extension '.{}', processing as {} by content",
                ext, found
            )),
        }),
        (None, None) => Err(Error::Input(format!(
            "unsupported file type: '.{}' (allowed: {})",
            ext,
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_matching_pdf() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "shenbao.pdf", b"%PDF-1.7\n...");
        let c = classify(&path).unwrap();
        assert_eq!(c.kind, DocumentKind::Pdf);
        assert!(c.warning.is_none());
    }

    #[test]
    fn test_mismatch_is_warning_not_rejection() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "scan.pdf", b"\x89PNG\r\n\x1a\nrest");
        let c = classify(&path).unwrap();
        assert_eq!(c.kind, DocumentKind::Pdf);
        assert!(c.warning.unwrap().contains("png"));
    }

    #[test]
    fn test_unknown_extension_with_magic_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "scan.bin", &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]);
        let c = classify(&path).unwrap();
        assert_eq!(c.kind, DocumentKind::Jpeg);
        assert!(c.warning.is_some());
    }

    #[test]
    fn test_unknown_extension_without_magic_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.txt", "民国十五年".as_bytes());
        let err = classify(&path).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_empty_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.png", b"");
        assert!(matches!(classify(&empty), Err(Error::Input(_))));
        assert!(matches!(
            classify(&dir.path().join("gone.pdf")),
            Err(Error::Input(_))
        ));
    }
}
