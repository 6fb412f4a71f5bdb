//! Startup-loaded, read-only map from language code to bundle.

use super::LocalizationBundle;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Display language used when a request carries no `lg` parameter
pub const DEFAULT_LANGUAGE: &str = "eng";

const DATA_FILE_EXTENSION: &str = "json";

/// All localization bundles, keyed by language code.
///
/// Built once by [`LocalizationStore::load`] and never mutated afterwards.
#[derive(Debug, Default)]
pub struct LocalizationStore {
    bundles: HashMap<String, Arc<LocalizationBundle>>,
}

impl LocalizationStore {
    /// Load every `*.json` file in `dir` as a bundle named after its file stem.
    ///
    /// Fails if the directory cannot be read, if it holds no bundles, or if
    /// any single file is malformed. A failure names the offending file.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read localization directory {}", dir.display()))?;

        let mut bundles = HashMap::new();

        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list {}", dir.display()))?
                .path();

            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(DATA_FILE_EXTENSION)
            {
                debug!("Skipping non-localization file {}", path.display());
                continue;
            }

            let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
                debug!("Skipping file with non-UTF-8 name {}", path.display());
                continue;
            };

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let bundle = LocalizationBundle::from_json(code, &content)
                .with_context(|| format!("Malformed localization file {}", path.display()))?;

            debug!("Loaded language {} (lv {})", code, bundle.lv());
            bundles.insert(code.to_string(), Arc::new(bundle));
        }

        if bundles.is_empty() {
            bail!("No localization files found in {}", dir.display());
        }

        let store = Self { bundles };
        info!("Loaded {} languages: {}", store.len(), store.codes().join(", "));
        Ok(store)
    }

    /// Build a store from already-parsed bundles
    #[cfg(test)]
    pub fn from_bundles(bundles: impl IntoIterator<Item = LocalizationBundle>) -> Self {
        Self {
            bundles: bundles
                .into_iter()
                .map(|b| (b.code().to_string(), Arc::new(b)))
                .collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<Arc<LocalizationBundle>> {
        self.bundles.get(code).cloned()
    }

    /// All language codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bundle_json(lv: i64, description: &str) -> String {
        format!(
            r#"{{"lv": {}, "teradict_description": "{}", "ex_not_found": "nf", "tr_not_found": "tnf"}}"#,
            lv, description
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).expect("Failed to write file");
    }

    // ==================== load Tests ====================

    #[test]
    fn test_load_indexes_by_file_stem() {
        let dir = TempDir::new().unwrap();
        write(&dir, "eng.json", &bundle_json(187, "English"));
        write(&dir, "spa.json", &bundle_json(666, "Español"));

        let store = LocalizationStore::load(dir.path()).expect("Should load");

        assert_eq!(store.len(), 2);
        assert_eq!(store.codes(), vec!["eng", "spa"]);
        for code in store.codes() {
            assert_eq!(store.get(code).unwrap().code(), code);
        }
        assert_eq!(store.get("spa").unwrap().lv(), 666);
        assert_eq!(store.get("eng").unwrap().subheading(), "English");
    }

    #[test]
    fn test_load_ignores_other_extensions() {
        let dir = TempDir::new().unwrap();
        write(&dir, "eng.json", &bundle_json(187, "English"));
        write(&dir, "README.md", "not a bundle");
        write(&dir, "fra.json.bak", "{broken");
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let store = LocalizationStore::load(dir.path()).expect("Should load");
        assert_eq!(store.codes(), vec!["eng"]);
    }

    #[test]
    fn test_load_unknown_code_is_none() {
        let dir = TempDir::new().unwrap();
        write(&dir, "eng.json", &bundle_json(187, "English"));

        let store = LocalizationStore::load(dir.path()).unwrap();
        assert!(store.get("xyz").is_none());
        assert!(store.get("").is_none());
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = LocalizationStore::load(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read localization directory"));
    }

    #[test]
    fn test_load_malformed_file_fails_and_names_it() {
        let dir = TempDir::new().unwrap();
        write(&dir, "eng.json", &bundle_json(187, "English"));
        write(&dir, "bad.json", r#"{"lv": 1}"#);

        let err = LocalizationStore::load(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.json"));
    }

    #[test]
    fn test_load_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = LocalizationStore::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No localization files"));
    }

    #[test]
    fn test_shipped_localization_files_load() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/i18n");
        let store = LocalizationStore::load(dir).expect("Shipped bundles should load");

        let english = store.get(DEFAULT_LANGUAGE).expect("Default language must ship");
        assert_eq!(english.lv(), 187);
        assert_eq!(store.get("spa").unwrap().lv(), 666);
    }

    // ==================== from_bundles Tests ====================

    #[test]
    fn test_from_bundles() {
        let eng = LocalizationBundle::from_json("eng", &bundle_json(187, "English")).unwrap();
        let store = LocalizationStore::from_bundles([eng]);

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert_eq!(store.get("eng").unwrap().lv(), 187);
    }
}
