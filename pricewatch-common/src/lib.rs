//! Common types and utilities shared across pricewatch crates.
//!
//! This crate defines the product data model and the observability helpers
//! used throughout the workspace. It is intentionally lightweight so that
//! every crate can depend on it without pulling in the network stack.
//!
//! # Overview
//!
//! - [`Observation`]: one fresh reading of a product page
//! - [`Availability`]: stock status as reported to users and persisted
//! - [`HistoryEntry`]: the last-known state kept per product URL
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use pricewatch_common::{Availability, HistoryEntry, Observation};
//! use rust_decimal::Decimal;
//!
//! let obs = Observation {
//!     title: Some("GPU A".into()),
//!     price: Some(Decimal::from(999)),
//!     on_sale: false,
//!     saving: None,
//!     availability: Availability::InStock,
//! };
//! let entry = HistoryEntry::from(&obs);
//! assert_eq!(entry.price, Some(Decimal::from(999)));
//! assert_eq!(entry.availability.to_string(), "In Stock");
//! ```
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod observability;

/// Stock status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "In Stock",
            Availability::OutOfStock => "Out of Stock",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reading of a product page.
///
/// Produced fresh on every fetch and never mutated; a later fetch replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub title: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub on_sale: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub saving: Option<Decimal>,
    pub availability: Availability,
}

/// Last-known state of a product, keyed by its URL in the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub availability: Availability,
}

impl From<&Observation> for HistoryEntry {
    fn from(obs: &Observation) -> Self {
        Self {
            price: obs.price,
            availability: obs.availability,
        }
    }
}

/// Render an optional value the way the console report expects (`None` when absent).
///
/// ```
/// use pricewatch_common::display_or_none;
///
/// assert_eq!(display_or_none(Some(&5)), "5");
/// assert_eq!(display_or_none::<u8>(None), "None");
/// ```
pub fn display_or_none<T: fmt::Display>(value: Option<&T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "None".to_string())
}
