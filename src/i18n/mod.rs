//! Localization bundles for the display language of each request.
//!
//! Bundles are loaded once at startup from a directory of JSON files, one
//! file per language code (`eng.json`, `spa.json`, ...). After loading, the
//! store is read-only and is shared with every request handler.
//!
//! # Architecture
//!
//! - `bundle`: one language's display strings and its PanLex lexical variety
//! - `store`: the directory loader and the code -> bundle lookup
//!
//! # Example
//!
//! ```rust,ignore
//! use teradict::i18n::LocalizationStore;
//!
//! let store = LocalizationStore::load("i18n")?;
//! let english = store.get("eng").expect("eng.json is shipped");
//! assert_eq!(english.lv(), 187);
//! ```

mod bundle;
mod store;

pub use bundle::{LocalizationBundle, REQUIRED_MESSAGES};
pub use store::{LocalizationStore, DEFAULT_LANGUAGE};
