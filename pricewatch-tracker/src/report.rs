//! Console lines for one tracked product.
use pricewatch_common::{Observation, display_or_none};
use std::io::{self, Write};

/// Print the product report block. Absent values print as `None`.
pub fn write_observation<W: Write>(out: &mut W, obs: &Observation) -> io::Result<()> {
    writeln!(out, "Product: {}", display_or_none(obs.title.as_ref()))?;
    writeln!(out, "Price: ${}", display_or_none(obs.price.as_ref()))?;
    writeln!(out, "Availability: {}", obs.availability)?;
    if obs.on_sale {
        writeln!(out, "On Sale! You save: ${}", display_or_none(obs.saving.as_ref()))?;
    }
    Ok(())
}

pub fn write_failure<W: Write>(out: &mut W, url: &str, reason: &dyn std::fmt::Display) -> io::Result<()> {
    writeln!(out, "Failed to retrieve product info for {url}: {reason}")
}
