//! Projection of the storefront's product record onto an [`Observation`].
use pricewatch_common::{Availability, Observation};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Price fields in precedence order; the first truthy one wins.
pub const PRICE_FIELDS: [&str; 3] = ["regularPrice", "priceWithEhf", "priceWithoutEhf"];

/// Flags on the record itself that each mean "not orderable now".
const OUT_OF_STOCK_FLAGS: [&str; 2] = ["isPreorderable", "isClearance"];

pub fn project(record: &Value) -> Observation {
    Observation {
        title: record.get("name").and_then(Value::as_str).map(str::to_string),
        price: first_price(record),
        on_sale: record.get("isOnSale").is_some_and(is_truthy),
        saving: record.get("saving").and_then(to_decimal),
        availability: availability(record),
    }
}

fn first_price(record: &Value) -> Option<Decimal> {
    for field in PRICE_FIELDS {
        let Some(raw) = record.get(field).filter(|v| is_truthy(v)) else {
            continue;
        };
        match to_decimal(raw) {
            Some(price) if !price.is_zero() => return Some(price),
            Some(_) => {}
            None => tracing::debug!(field, value=%raw, "extract.price.unparseable"),
        }
    }
    None
}

fn availability(record: &Value) -> Availability {
    let flagged = OUT_OF_STOCK_FLAGS
        .iter()
        .any(|f| record.get(*f).is_some_and(is_truthy));
    let availability_error = record
        .get("availability")
        .and_then(|a| a.get("isAvailabilityError"))
        .is_some_and(is_truthy);

    if flagged || availability_error {
        Availability::OutOfStock
    } else {
        Availability::InStock
    }
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Numbers and numeric strings become decimals; anything else is `None`.
pub fn to_decimal(v: &Value) -> Option<Decimal> {
    let text = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
