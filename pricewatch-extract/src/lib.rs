//! Product extraction from storefront HTML.
//!
//! The storefront hydrates its client from a state object assigned in an
//! inline script (`window.__INITIAL_STATE__ = {...};`). [`extract`] finds
//! that script structurally, cuts the object literal out with a
//! balanced-delimiter scan, parses it as JSON, and projects the fields of
//! `product.product` onto an [`Observation`].
//!
//! ```
//! use pricewatch_common::Availability;
//! use pricewatch_extract::extract;
//! use rust_decimal::Decimal;
//!
//! let html = r#"<script>window.__INITIAL_STATE__ = {"product": {"product": {
//!     "name": "GPU A", "priceWithoutEhf": 999, "isClearance": false
//! }}};</script>"#;
//!
//! let obs = extract(html).unwrap();
//! assert_eq!(obs.title.as_deref(), Some("GPU A"));
//! assert_eq!(obs.price, Some(Decimal::from(999)));
//! assert_eq!(obs.availability, Availability::InStock);
//! ```
//!
//! Extraction is pure and never panics; every failure is an [`ExtractError`].
pub mod project;
pub mod scan;
pub mod script;

use pricewatch_common::Observation;
use serde_json::Value;
use thiserror::Error;

/// Global the storefront assigns its client state to.
pub const STATE_MARKER: &str = "window.__INITIAL_STATE__";

const PRODUCT_PATH: [&str; 2] = ["product", "product"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no inline script contains window.__INITIAL_STATE__")]
    MarkerNotFound,
    #[error("could not isolate the state object: {0}")]
    PayloadNotExtracted(&'static str),
    #[error("state object is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("state object has no record at `{0}`")]
    FieldPathMissing(&'static str),
}

/// Extract one observation from a product page.
pub fn extract(html: &str) -> Result<Observation, ExtractError> {
    let state = parse_state(html)?;
    let record = product_record(&state)?;
    let obs = project::project(record);
    tracing::debug!(
        title=?obs.title,
        price=?obs.price,
        availability=%obs.availability,
        "extract.observation"
    );
    Ok(obs)
}

/// The parsed client-state document, before any field projection.
pub fn parse_state(html: &str) -> Result<Value, ExtractError> {
    let script =
        script::find_state_script(html, STATE_MARKER).ok_or(ExtractError::MarkerNotFound)?;
    let payload = script::assigned_object(&script, STATE_MARKER)
        .map_err(|issue| ExtractError::PayloadNotExtracted(issue.describe()))?;
    tracing::trace!(payload_len = payload.len(), "extract.payload");
    Ok(serde_json::from_str(payload)?)
}

/// Navigate to `product.product`; it must be a non-empty object.
fn product_record(state: &Value) -> Result<&Value, ExtractError> {
    PRODUCT_PATH
        .iter()
        .try_fold(state, |node, key| node.get(*key))
        .filter(|rec| rec.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or(ExtractError::FieldPathMissing("product.product"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_path_must_be_a_populated_object() {
        assert!(product_record(&json!({ "product": { "product": { "name": "x" } } })).is_ok());
        for state in [
            json!({}),
            json!({ "product": null }),
            json!({ "product": { "product": null } }),
            json!({ "product": { "product": {} } }),
            json!({ "product": { "product": [1, 2] } }),
            json!({ "product": "gone" }),
        ] {
            assert!(
                matches!(product_record(&state), Err(ExtractError::FieldPathMissing(_))),
                "{state}"
            );
        }
    }

    #[test]
    fn errors_render_for_console() {
        assert_eq!(
            ExtractError::MarkerNotFound.to_string(),
            "no inline script contains window.__INITIAL_STATE__"
        );
    }
}
