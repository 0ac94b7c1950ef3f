//! Locating and loading `quizpdf.toml`.

use std::path::{Path, PathBuf};

use quizpdf_core::ExtractionConfig;

use crate::prelude::*;

pub const DEFAULT_CONFIG_FILE: &str = "quizpdf.toml";

/// Load the extraction config.
///
/// An explicit `path` must exist. Without one, `quizpdf.toml` in the working
/// directory is used when present and the built-in defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<ExtractionConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.is_file() {
                log::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                return Ok(ExtractionConfig::default());
            }
            fallback
        }
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| f!("failed to read config file {}", path.display()))?;
    let config = ExtractionConfig::from_toml_str(&raw)
        .map_err(Error::from)
        .with_context(|| f!("failed to load config file {}", path.display()))?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use quizpdf_core::HorizontalMatch;

    use super::*;

    #[test]
    fn test_explicit_file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[underline]\nhorizontal = \"overlap\"\n\n[patterns]\nquestion_keyword = \"Question\""
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.underline.horizontal, HorizontalMatch::Overlap);
        assert_eq!(config.patterns.question_keyword, "Question");
        assert_eq!(config.page_numbers.max_digits, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_invalid_thresholds_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[underline]\nmax_height = 0.0").unwrap();
        let err = load(Some(file.path())).unwrap_err();
        assert!(err.downcast_ref::<Error>().is_some());
    }
}
