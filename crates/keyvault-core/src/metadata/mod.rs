//! Non-secret metadata and preference persistence

mod document;
mod store;

pub use document::{PreferencesDocument, WindowBounds, API_KEYS_KEY};
pub use store::{JsonFileMetadataStore, MetadataStore, PREFERENCES_FILE};
