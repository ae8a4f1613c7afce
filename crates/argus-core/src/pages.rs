use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_active() -> bool {
    true
}

/// A page entry in `config/pages.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSeed {
    pub name: String,
    /// CMS page URL, or an id resolved against `ARGUS_CMS_BASE_URL`.
    pub cms_source_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesFile {
    pub pages: Vec<PageSeed>,
}

/// Load and validate the page seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_pages(path: &Path) -> Result<PagesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PagesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let pages_file: PagesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::PagesFileParse)?;

    validate_pages(&pages_file)?;

    Ok(pages_file)
}

fn validate_pages(pages_file: &PagesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for page in &pages_file.pages {
        if page.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "page name must be non-empty".to_string(),
            ));
        }

        if page.cms_source_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "page '{}' has an empty cms_source_id",
                page.name
            )));
        }

        if !seen_names.insert(page.name.trim().to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate page name: '{}'",
                page.name
            )));
        }
    }

    Ok(())
}
