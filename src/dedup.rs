//! Duplicate suppression over raw itineraries.
//!
//! The upstream API returns the same physical itinerary several times when
//! more than one fare partner sells it. Two passes run before
//! normalization: by upstream id, then by a content fingerprint.

use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::raw::{RawItinerary, RawSector};

fn push_sector(parts: &mut Vec<String>, sector: Option<&RawSector>) {
    let Some(sector) = sector else {
        return;
    };
    for seg in sector.segments() {
        let departure = seg.source.as_ref().map_or("", |e| e.local_time());
        let arrival = seg.destination.as_ref().map_or("", |e| e.local_time());
        parts.push(format!(
            "{}{}-{departure}-{arrival}",
            seg.carrier_code(),
            seg.flight_number()
        ));
    }
}

/// Carrier + flight number + local timestamps of every segment (outbound
/// then inbound), followed by the price rounded to a whole unit.
///
/// Offers that differ by less than half a currency unit on the same
/// routing share a fingerprint.
pub fn fingerprint(raw: &RawItinerary) -> String {
    let mut parts = Vec::new();
    push_sector(&mut parts, raw.outbound());
    push_sector(&mut parts, raw.inbound());
    let price = raw.price.unwrap_or(0.0).round() as i64;
    parts.push(price.to_string());
    parts.join("|")
}

/// Stable id for records the API sent without one.
pub fn fallback_id(raw: &RawItinerary) -> String {
    let digest = Sha256::digest(fingerprint(raw).as_bytes());
    format!("fp-{}", &URL_SAFE_NO_PAD.encode(digest)[..16])
}

/// First occurrence wins in both passes; relative order is preserved.
pub fn deduplicate(items: Vec<RawItinerary>) -> Vec<RawItinerary> {
    let before = items.len();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_prints: HashSet<String> = HashSet::new();

    let kept: Vec<RawItinerary> = items
        .into_iter()
        .filter(|it| match it.upstream_id() {
            Some(id) => seen_ids.insert(id.to_string()),
            None => true,
        })
        .filter(|it| seen_prints.insert(fingerprint(it)))
        .collect();

    if kept.len() < before {
        tracing::debug!(
            dropped = before - kept.len(),
            kept = kept.len(),
            "removed duplicate itineraries"
        );
    }

    kept
}
