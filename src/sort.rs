//! Ordering and display tags.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::FlightError;
use crate::model::{Flight, Tag};

/// Weights of the BEST score. Lower scores rank first. These are tuning
/// knobs, not derived values.
pub const BEST_PRICE_DIVISOR: f64 = 100.0;
pub const BEST_STOP_PENALTY: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOption {
    #[default]
    Best,
    Cheapest,
    Fastest,
}

impl SortOption {
    pub fn from_str_loose(s: &str) -> Result<Self, FlightError> {
        match s.to_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "cheapest" | "price" => Ok(Self::Cheapest),
            "fastest" | "duration" => Ok(Self::Fastest),
            _ => Err(FlightError::Validation(format!("invalid sort option: {s}"))),
        }
    }
}

/// `price/100 + total hours + 2 * total stops`.
pub fn best_score(flight: &Flight) -> f64 {
    flight.price / BEST_PRICE_DIVISOR
        + f64::from(flight.total_duration_minutes()) / 60.0
        + BEST_STOP_PENALTY * f64::from(flight.total_stops())
}

fn compare(a: &Flight, b: &Flight, option: SortOption) -> Ordering {
    match option {
        SortOption::Cheapest => a.price.total_cmp(&b.price),
        SortOption::Fastest => a
            .total_duration_minutes()
            .cmp(&b.total_duration_minutes()),
        SortOption::Best => best_score(a).total_cmp(&best_score(b)),
    }
}

/// Stable; the input is left untouched.
pub fn sort_flights(flights: &[Flight], option: SortOption) -> Vec<Flight> {
    let mut sorted = flights.to_vec();
    sorted.sort_by(|a, b| compare(a, b, option));
    sorted
}

/// Index of the first element that is minimal under `key`.
fn first_min_by<F>(flights: &[Flight], key: F) -> Option<usize>
where
    F: Fn(&Flight) -> f64,
{
    flights
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, f)| {
            let k = key(f);
            match best {
                Some((_, current)) if current <= k => best,
                _ => Some((idx, k)),
            }
        })
        .map(|(idx, _)| idx)
}

/// Replaces each flight's tags. Cheapest and Best go to exactly one flight
/// (first on ties); Fastest goes to every flight at the minimum duration.
pub fn tag_flights(mut flights: Vec<Flight>) -> Vec<Flight> {
    let cheapest = first_min_by(&flights, |f| f.price);
    let best = first_min_by(&flights, best_score);
    let fastest = flights.iter().map(Flight::total_duration_minutes).min();

    for (idx, flight) in flights.iter_mut().enumerate() {
        let mut tags = Vec::new();
        if cheapest == Some(idx) {
            tags.push(Tag::Cheapest);
        }
        if fastest == Some(flight.total_duration_minutes()) {
            tags.push(Tag::Fastest);
        }
        if best == Some(idx) {
            tags.push(Tag::Best);
        }
        if !flight.outbound.is_empty() && flight.outbound.stops == 0 {
            tags.push(Tag::Direct);
        }
        if flight.baggage.any_included() {
            tags.push(Tag::BagsIncluded);
        }
        flight.tags = tags;
    }

    flights
}
