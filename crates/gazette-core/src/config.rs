//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all archive data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Saved uploads (`data/raw/`).
    pub raw: PathBuf,
    /// Rendered page images, one `newspaper_<id>/` per document (`data/processed/`).
    pub processed: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            raw: root.join("raw"),
            processed: root.join("processed"),
            db: root.join("db"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.raw)?;
        std::fs::create_dir_all(&self.processed)?;
        std::fs::create_dir_all(&self.db)?;
        Ok(())
    }
}

/// Top-level archive configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Rasterization resolution for PDF pages.
    pub render_dpi: u32,
    /// Directory containing `pdftoppm`; `None` means search `PATH`.
    pub poppler_path: Option<PathBuf>,
    /// External recognition command, invoked as `<cmd> <image-path>`.
    pub recognizer_command: Option<String>,
    /// Number of ranked keywords kept per article.
    pub keyword_top_k: usize,
    /// Extra word segmentation dictionary (`word [freq] [tag]` per line).
    pub user_dict: Option<PathBuf>,
    /// Upload size limit in bytes.
    pub max_upload_bytes: usize,
}

impl GazetteConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = env_parse("PORT").unwrap_or(5000);
        let render_dpi = env_parse("RENDER_DPI").unwrap_or(300);
        let keyword_top_k = env_parse("KEYWORD_TOP_K").unwrap_or(10);
        let max_upload_mb: usize = env_parse("MAX_UPLOAD_MB").unwrap_or(100);

        // Windows-style separators in POPPLER_PATH are normalized.
        let poppler_path = std::env::var("POPPLER_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(|p| PathBuf::from(p.replace('\\', "/")));
        if let Some(p) = &poppler_path {
            if !p.exists() {
                tracing::warn!("POPPLER_PATH does not exist: {}", p.display());
            }
        }
        let recognizer_command = std::env::var("GAZETTE_RECOGNIZER")
            .ok()
            .filter(|c| !c.trim().is_empty());
        let user_dict = std::env::var("GAZETTE_USER_DICT")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            render_dpi,
            poppler_path,
            recognizer_command,
            keyword_top_k,
            user_dict,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }

    /// Defaults rooted at `data_dir`, ignoring the environment.
    pub fn with_defaults(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            port: 5000,
            data_paths: DataPaths::new(data_dir)?,
            render_dpi: 300,
            poppler_path: None,
            recognizer_command: None,
            keyword_top_k: 10,
            user_dict: None,
            max_upload_bytes: 100 * 1024 * 1024,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_creates_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.raw.is_dir());
        assert!(paths.processed.is_dir());
        assert!(paths.db.is_dir());
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = GazetteConfig::with_defaults(dir.path()).unwrap();
        assert_eq!(config.render_dpi, 300);
        assert_eq!(config.keyword_top_k, 10);
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
        assert!(config.recognizer_command.is_none());
        assert!(config.user_dict.is_none());
    }
}
