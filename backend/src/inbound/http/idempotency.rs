//! `Idempotency-Key` header parsing.

use actix_web::http::header::HeaderMap;

use crate::domain::Error;
use crate::domain::IdempotencyKey;
use crate::domain::idempotency::IdempotencyKeyValidationError;

/// HTTP header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Extract the idempotency key from request headers.
///
/// A missing, empty or all-whitespace header means "no key". Surrounding
/// whitespace is trimmed before validation.
///
/// # Errors
///
/// Returns an `invalid_request` error when the header is not visible ASCII
/// or is longer than the accepted maximum.
pub fn extract_idempotency_key(headers: &HeaderMap) -> Result<Option<IdempotencyKey>, Error> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| Error::invalid_request("idempotency-key header must be visible ASCII"))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    IdempotencyKey::new(trimmed)
        .map(Some)
        .map_err(map_idempotency_key_error)
}

fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    Error::invalid_request(format!("invalid idempotency-key header: {err}"))
}
