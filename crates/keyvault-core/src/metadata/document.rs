//! On-disk preferences document
//!
//! A single JSON document holds both generic app preferences and the
//! credential metadata list:
//!
//! ```json
//! { "windowBounds": { "width": 1200, "height": 800 }, "theme": "system", "apiKeys": [] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credential::CredentialMetadata;

/// Top-level key holding the credential metadata list
pub const API_KEYS_KEY: &str = "apiKeys";

/// Main window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

fn default_theme() -> String {
    "system".to_string()
}

/// Whole preferences document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesDocument {
    #[serde(default)]
    pub window_bounds: WindowBounds,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default)]
    pub api_keys: Vec<CredentialMetadata>,

    /// Any other preference keys the shell has set
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PreferencesDocument {
    fn default() -> Self {
        Self {
            window_bounds: WindowBounds::default(),
            theme: default_theme(),
            api_keys: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Whether a dotted preference key addresses the reserved metadata list
pub fn is_reserved_key(key: &str) -> bool {
    key == API_KEYS_KEY || key.starts_with("apiKeys.")
}

/// Look up a dotted path (`windowBounds.width`) inside a JSON value
pub fn get_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(root, |current, segment| current.as_object()?.get(segment))
}

/// Set a dotted path inside a JSON value, creating intermediate objects.
///
/// Returns `false` when a non-object value sits on the path.
pub fn set_path(root: &mut Value, key: &str, value: Value) -> bool {
    let mut segments: Vec<&str> = key.split('.').collect();
    let last = match segments.pop() {
        Some(last) => last,
        None => return false,
    };

    let mut current = root;
    for segment in segments {
        let Some(object) = current.as_object_mut() else {
            return false;
        };
        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    match current.as_object_mut() {
        Some(object) => {
            object.insert(last.to_string(), value);
            true
        }
        None => false,
    }
}
