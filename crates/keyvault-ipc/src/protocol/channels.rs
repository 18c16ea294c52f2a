//! Channel names understood by the host

pub const API_KEYS_STORE: &str = "api-keys:store";
pub const API_KEYS_GET: &str = "api-keys:get";
pub const API_KEYS_LIST: &str = "api-keys:list";
pub const API_KEYS_DELETE: &str = "api-keys:delete";
pub const AUTH_CHECK_BIOMETRIC: &str = "auth:check-biometric";
pub const PREFERENCES_GET: &str = "preferences:get";
pub const PREFERENCES_SET: &str = "preferences:set";
pub const CLIPBOARD_WRITE_TEXT: &str = "clipboard:write-text";
pub const CLIPBOARD_READ_TEXT: &str = "clipboard:read-text";
pub const CLIPBOARD_CLEAR: &str = "clipboard:clear";
pub const UTILS_GENERATE_ID: &str = "utils:generate-id";
pub const UTILS_VALIDATE_KEY: &str = "utils:validate-key";

/// Every channel, in the order the host documents them
pub const ALL: [&str; 12] = [
    API_KEYS_STORE,
    API_KEYS_GET,
    API_KEYS_LIST,
    API_KEYS_DELETE,
    AUTH_CHECK_BIOMETRIC,
    PREFERENCES_GET,
    PREFERENCES_SET,
    CLIPBOARD_WRITE_TEXT,
    CLIPBOARD_READ_TEXT,
    CLIPBOARD_CLEAR,
    UTILS_GENERATE_ID,
    UTILS_VALIDATE_KEY,
];
