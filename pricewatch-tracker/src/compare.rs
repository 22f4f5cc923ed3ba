//! Change detection between the stored entry and a fresh observation.
use pricewatch_common::{Availability, HistoryEntry, Observation};
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    PriceDropped {
        previous: Decimal,
        current: Decimal,
    },
    AvailabilityChanged {
        previous: Availability,
        current: Availability,
    },
}

/// Renders the alert line for this event.
impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::PriceDropped { previous, current } => {
                write!(f, "Price dropped! Previous: ${previous}, Now: ${current}")
            }
            ChangeEvent::AvailabilityChanged { previous, current } => {
                write!(f, "Stock change! Previous: {previous}, Now: {current}")
            }
        }
    }
}

/// Events worth alerting on. A first observation (no previous entry) only
/// sets the baseline. Price increases and missing prices never fire.
pub fn compare(previous: Option<&HistoryEntry>, current: &Observation) -> Vec<ChangeEvent> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let mut events = Vec::new();
    if let (Some(before), Some(now)) = (previous.price, current.price) {
        if now < before {
            events.push(ChangeEvent::PriceDropped {
                previous: before,
                current: now,
            });
        }
    }
    if previous.availability != current.availability {
        events.push(ChangeEvent::AvailabilityChanged {
            previous: previous.availability,
            current: current.availability,
        });
    }
    events
}

/// Alert body: the product title, then one line per event.
pub fn alert_message(title: &str, events: &[ChangeEvent]) -> String {
    let mut msg = title.to_string();
    for event in events {
        msg.push('\n');
        msg.push_str(&event.to_string());
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prev(price: Option<i64>, availability: Availability) -> HistoryEntry {
        HistoryEntry {
            price: price.map(Decimal::from),
            availability,
        }
    }

    fn obs(price: Option<i64>, availability: Availability) -> Observation {
        Observation {
            title: Some("GPU A".into()),
            price: price.map(Decimal::from),
            on_sale: false,
            saving: None,
            availability,
        }
    }

    #[test]
    fn price_drop_only() {
        let events = compare(
            Some(&prev(Some(100), Availability::InStock)),
            &obs(Some(90), Availability::InStock),
        );
        assert_eq!(
            events,
            vec![ChangeEvent::PriceDropped {
                previous: Decimal::from(100),
                current: Decimal::from(90),
            }]
        );
    }

    #[test]
    fn availability_change_only() {
        let events = compare(
            Some(&prev(Some(100), Availability::InStock)),
            &obs(Some(100), Availability::OutOfStock),
        );
        assert_eq!(
            events,
            vec![ChangeEvent::AvailabilityChanged {
                previous: Availability::InStock,
                current: Availability::OutOfStock,
            }]
        );
    }

    #[test]
    fn no_previous_entry_is_baseline_only() {
        for current in [
            obs(Some(1), Availability::InStock),
            obs(None, Availability::OutOfStock),
        ] {
            assert!(compare(None, &current).is_empty());
        }
    }

    #[test]
    fn increases_equal_and_missing_prices_do_not_fire() {
        let p = prev(Some(100), Availability::InStock);
        assert!(compare(Some(&p), &obs(Some(120), Availability::InStock)).is_empty());
        assert!(compare(Some(&p), &obs(Some(100), Availability::InStock)).is_empty());
        assert!(compare(Some(&p), &obs(None, Availability::InStock)).is_empty());
        let unpriced = prev(None, Availability::InStock);
        assert!(compare(Some(&unpriced), &obs(Some(1), Availability::InStock)).is_empty());
    }

    #[test]
    fn both_events_fire_price_first() {
        let events = compare(
            Some(&prev(Some(100), Availability::OutOfStock)),
            &obs(Some(80), Availability::InStock),
        );
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ChangeEvent::PriceDropped { .. }));
        assert!(matches!(events[1], ChangeEvent::AvailabilityChanged { .. }));
    }

    #[test]
    fn alert_message_lists_events_under_title() {
        let events = vec![
            ChangeEvent::PriceDropped {
                previous: Decimal::new(99999, 2),
                current: Decimal::new(89999, 2),
            },
            ChangeEvent::AvailabilityChanged {
                previous: Availability::OutOfStock,
                current: Availability::InStock,
            },
        ];
        assert_eq!(
            alert_message("GPU A", &events),
            "GPU A\nPrice dropped! Previous: $999.99, Now: $899.99\nStock change! Previous: Out of Stock, Now: In Stock"
        );
    }
}
