//! Credential data model: metadata, secret wrapper and input checks

mod types;
mod validation;

pub use types::*;
pub use validation::{generate_id, is_valid_secret, min_secret_length, validate_store};
