//! Year data loading.
//!
//! One JSON document per year identifier, read fresh on every call from
//! `{data_dir}/{year_id}.json`. Failures are logged and returned as a typed
//! [`LoadError`]; nothing here panics or aborts the caller.

use crate::models::{YearRecord, YearStatus};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Why a year's data could not be used.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("data file for year {year_id} not found: {}", .path.display())]
    NotFound { year_id: String, path: PathBuf },

    #[error("error parsing JSON data for year {year_id}: {source}")]
    Corrupt {
        year_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("data file for year {year_id} could not be read: {source}")]
    Unreadable {
        year_id: String,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// The year status this failure maps to.
    pub fn status(&self) -> YearStatus {
        match self {
            LoadError::NotFound { .. } => YearStatus::NotFound,
            LoadError::Corrupt { .. } => YearStatus::Corrupt,
            LoadError::Unreadable { .. } => YearStatus::Unreadable,
        }
    }
}

/// Anything that can produce a year's record.
pub trait YearSource {
    fn load(&self, year_id: &str) -> Result<YearRecord, LoadError>;
}

/// Reads year documents from a directory of `{year_id}.json` files.
#[derive(Debug, Clone)]
pub struct JsonDirLoader {
    data_dir: PathBuf,
}

impl JsonDirLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Backing path for a year identifier.
    pub fn path_for(&self, year_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", year_id))
    }

    fn read(&self, year_id: &str) -> Result<YearRecord, LoadError> {
        let path = self.path_for(year_id);

        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                year_id: year_id.to_string(),
                path: path.clone(),
            },
            _ => LoadError::Unreadable {
                year_id: year_id.to_string(),
                source: e,
            },
        })?;

        // from_slice rejects invalid UTF-8 as a parse error
        let document: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::Corrupt {
                year_id: year_id.to_string(),
                source: e,
            })?;

        Ok(YearRecord::new(year_id, document))
    }
}

impl YearSource for JsonDirLoader {
    fn load(&self, year_id: &str) -> Result<YearRecord, LoadError> {
        match self.read(year_id) {
            Ok(record) => {
                debug!("Loaded {}", self.path_for(year_id).display());
                Ok(record)
            }
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }
}

/// List year identifiers for the `*.json` files directly inside `data_dir`.
///
/// Newest first. A missing directory yields no years.
pub fn discover_years(data_dir: &Path) -> Vec<String> {
    let mut years: Vec<String> = WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping entry in {}: {}", data_dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("json"))
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(String::from)
        })
        .collect();

    years.sort_by(|a, b| b.cmp(a));
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_load_success() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "2023.json",
            br#"{"courses": [{"title": "Test Course", "metrics": {"completed": 10}}]}"#,
        );

        let loader = JsonDirLoader::new(dir.path());
        let record = loader.load("2023").unwrap();

        assert_eq!(record.year_id(), "2023");
        assert_eq!(record.section_len("courses"), 1);
        assert_eq!(record.courses()[0].metrics_completed, Some(10));
    }

    #[test]
    fn test_load_not_found() {
        let dir = TempDir::new().unwrap();
        let loader = JsonDirLoader::new(dir.path());

        let err = loader.load("nonexistent_year").unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(err.status(), YearStatus::NotFound);
        assert!(err.to_string().contains("nonexistent_year"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        write(&dir, "invalid.json", b"{\"invalid\": json}");

        let loader = JsonDirLoader::new(dir.path());
        let err = loader.load("invalid").unwrap_err();

        assert!(matches!(err, LoadError::Corrupt { .. }));
        assert_eq!(err.status(), YearStatus::Corrupt);
    }

    #[test]
    fn test_load_invalid_utf8_is_corrupt() {
        let dir = TempDir::new().unwrap();
        write(&dir, "2024.json", &[b'{', 0xff, 0xfe, b'}']);

        let loader = JsonDirLoader::new(dir.path());
        assert!(matches!(
            loader.load("2024"),
            Err(LoadError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("2025.json")).unwrap();

        let loader = JsonDirLoader::new(dir.path());
        let err = loader.load("2025").unwrap_err();
        assert_eq!(err.status(), YearStatus::Unreadable);
    }

    #[test]
    fn test_load_rereads_every_call() {
        let dir = TempDir::new().unwrap();
        write(&dir, "2025.json", br#"{"research": [{}]}"#);

        let loader = JsonDirLoader::new(dir.path());
        assert_eq!(loader.load("2025").unwrap().section_len("research"), 1);

        write(&dir, "2025.json", br#"{"research": [{}, {}, {}]}"#);
        assert_eq!(loader.load("2025").unwrap().section_len("research"), 3);
    }

    #[test]
    fn test_discover_years() {
        let dir = TempDir::new().unwrap();
        write(&dir, "2023.json", b"{}");
        write(&dir, "2025.json", b"{}");
        write(&dir, "2024.json", b"{}");
        write(&dir, "notes.txt", b"ignored");
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("2022.json"), b"{}").unwrap();

        assert_eq!(discover_years(dir.path()), vec!["2025", "2024", "2023"]);
    }

    #[test]
    fn test_discover_years_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(discover_years(&dir.path().join("missing")).is_empty());
    }
}
