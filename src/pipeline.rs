use crate::dedup::deduplicate;
use crate::filter::{apply_filters, FilterState};
use crate::model::Flight;
use crate::normalize::{normalize_all, NormalizeOptions};
use crate::raw::RawItinerary;
use crate::sort::{sort_flights, tag_flights, SortOption};

/// Dedup and normalize one response. The result is what a session keeps
/// for the lifetime of a search.
pub fn ingest(raw: Vec<RawItinerary>, is_round_trip: bool, opts: &NormalizeOptions) -> Vec<Flight> {
    let unique = deduplicate(raw);
    normalize_all(&unique, is_round_trip, opts)
}

/// Filter, order and tag already-normalized flights.
pub fn arrange(flights: &[Flight], filters: &FilterState, sort: SortOption) -> Vec<Flight> {
    let kept = apply_filters(flights, filters);
    tracing::debug!(total = flights.len(), kept = kept.len(), ?sort, "applied filters");
    tag_flights(sort_flights(&kept, sort))
}

/// Full pipeline: dedup, normalize, filter, sort, tag.
pub fn run(
    raw: Vec<RawItinerary>,
    is_round_trip: bool,
    filters: &FilterState,
    sort: SortOption,
    opts: &NormalizeOptions,
) -> Vec<Flight> {
    arrange(&ingest(raw, is_round_trip, opts), filters, sort)
}
