//! Validation for operator-supplied text: price override entries and ids.

use thiserror::Error;
use uuid::Uuid;

/// Maximum accepted length of a namespaced resource id
pub const MAX_RESOURCE_ID_LEN: usize = 128;
/// Namespace assumed for ids written without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Price override validation errors with helpful messages
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverrideError {
    #[error("expected '<id>/<price>', got '{entry}'")]
    Malformed { entry: String },

    #[error("price '{price}' is not a non-negative integer")]
    InvalidPrice { price: String },

    #[error("resource id '{id}' is invalid: {reason}")]
    InvalidResourceId { id: String, reason: &'static str },
}

/// A parsed `<id>/<price>` override entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceOverride {
    pub id: String,
    pub price: u32,
}

fn is_resource_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' || c == '.'
}

/// Validate a resource id such as `minecraft:golden_apple` or `forge:gems`.
/// An id without a namespace resolves to `minecraft`.
pub fn validate_resource_id(id: &str) -> Result<String, OverrideError> {
    let trimmed = id.trim();
    let invalid = |reason| OverrideError::InvalidResourceId {
        id: trimmed.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    if trimmed.len() > MAX_RESOURCE_ID_LEN {
        return Err(invalid("too long"));
    }

    let (namespace, path) = trimmed
        .split_once(':')
        .unwrap_or((DEFAULT_NAMESPACE, trimmed));
    if namespace.is_empty() || path.is_empty() {
        return Err(invalid("empty namespace or path"));
    }
    if !namespace.chars().all(is_resource_char) || !path.chars().all(is_resource_char) {
        return Err(invalid("only lowercase letters, digits, '_', '-' and '.' are allowed"));
    }

    Ok(format!("{}:{}", namespace, path))
}

/// Parse one override entry of the form `<namespace:path>/<price>`.
pub fn parse_price_override(entry: &str) -> Result<PriceOverride, OverrideError> {
    let parts: Vec<&str> = entry.trim().split('/').collect();
    let [id, price] = parts.as_slice() else {
        return Err(OverrideError::Malformed {
            entry: entry.to_string(),
        });
    };

    let price = price
        .trim()
        .parse::<u32>()
        .map_err(|_| OverrideError::InvalidPrice {
            price: price.trim().to_string(),
        })?;
    let id = validate_resource_id(id)?;

    Ok(PriceOverride { id, price })
}

/// Validate a player or merchant id (must be a UUID)
pub fn validate_uuid(text: &str) -> Option<Uuid> {
    Uuid::parse_str(text.trim()).ok()
}
