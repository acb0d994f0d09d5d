//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::{MAX_KEY_LENGTH, MAX_VALUE_SIZE};

/// Request body for the set, add and replace operations
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: TTL in seconds, 0 (the default) never expires
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// TTL in seconds
    #[serde(default)]
    pub ttl: u64,
}

impl StoreRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(error) = validate_key(&self.key) {
            return Some(error);
        }
        if self.value.len() > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        None
    }
}

/// Request body for a batch get (POST /get)
#[derive(Debug, Clone, Deserialize)]
pub struct GetMultiRequest {
    pub keys: Vec<String>,
}

impl GetMultiRequest {
    pub fn validate(&self) -> Option<String> {
        self.keys.iter().find_map(|key| validate_key(key))
    }
}

/// Query string for incr/decr
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustParams {
    #[serde(default = "default_amount")]
    pub amount: u64,
}

fn default_amount() -> u64 {
    1
}

/// Query string for delete; a positive ttl schedules expiry instead of removing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub ttl: u64,
}

/// Query string for flush_all
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlushParams {
    pub delay: Option<u64>,
}

/// Checks a key against memcache rules: non-empty, at most 250 bytes,
/// no whitespace or control characters.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Some("Key cannot contain whitespace or control characters".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: StoreRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert_eq!(req.ttl, 0);
    }

    #[test]
    fn test_store_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl": 60}"#;
        let req: StoreRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, 60);
    }

    #[test]
    fn test_validate_empty_key() {
        let req = StoreRequest {
            key: "".to_string(),
            value: "test".to_string(),
            ttl: 0,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_value_too_large() {
        let req = StoreRequest {
            key: "k".to_string(),
            value: "x".repeat(MAX_VALUE_SIZE + 1),
            ttl: 0,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = StoreRequest {
            key: "valid_key".to_string(),
            value: "test".to_string(),
            ttl: 60,
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_key_rules() {
        assert!(validate_key("user:42").is_none());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH)).is_none());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key("has space").is_some());
        assert!(validate_key("tab\tkey").is_some());
        assert!(validate_key("nul\0key").is_some());
    }

    #[test]
    fn test_get_multi_request_validate() {
        let req: GetMultiRequest = serde_json::from_str(r#"{"keys": ["a", "b c"]}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_adjust_params_default_amount() {
        let params: AdjustParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.amount, 1);
    }
}
