//! Raw upstream itineraries to [`Flight`].
//!
//! Nothing in here fails: missing or malformed input yields
//! [`Leg::empty`] and zero/empty defaults so one bad record never aborts a
//! result set.

use chrono::NaiveDateTime;

use crate::dedup;
use crate::model::{BaggageInfo, Flight, Layover, Leg, Place, Segment};
use crate::raw::{RawBagsInfo, RawEndpoint, RawItinerary, RawSector, RawSegment};
use crate::timefmt::{format_clock, format_date, format_duration, parse_local_time, seconds_to_minutes};

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub currency: String,
    /// `{code}` is replaced by the carrier code.
    pub logo_url_template: String,
    /// Prefix for relative booking URLs.
    pub booking_base_url: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            logo_url_template: crate::config::DEFAULT_LOGO_URL.to_string(),
            booking_base_url: crate::config::DEFAULT_BOOKING_URL.to_string(),
        }
    }
}

impl NormalizeOptions {
    pub fn logo_url(&self, carrier_code: &str) -> String {
        if carrier_code.is_empty() {
            return String::new();
        }
        self.logo_url_template.replace("{code}", carrier_code)
    }

    pub fn booking_url(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with("http://") || raw.starts_with("https://") {
            return raw.to_string();
        }
        let base = self.booking_base_url.trim_end_matches('/');
        if raw.starts_with('/') {
            format!("{base}{raw}")
        } else {
            format!("{base}/{raw}")
        }
    }
}

fn place(endpoint: Option<&RawEndpoint>) -> Place {
    endpoint
        .map(|e| Place {
            name: e.city().to_string(),
            code: e.code().to_string(),
        })
        .unwrap_or_default()
}

fn timestamp(endpoint: Option<&RawEndpoint>) -> Option<NaiveDateTime> {
    endpoint.and_then(|e| parse_local_time(e.local_time()))
}

fn clock_and_date(ts: Option<&NaiveDateTime>) -> (String, String) {
    ts.map(|t| (format_clock(t), format_date(t)))
        .unwrap_or_default()
}

fn normalize_segment(raw: &RawSegment) -> Segment {
    let (departure_time, departure_date) = clock_and_date(timestamp(raw.source.as_ref()).as_ref());
    let (arrival_time, arrival_date) =
        clock_and_date(timestamp(raw.destination.as_ref()).as_ref());
    let duration_minutes = seconds_to_minutes(raw.duration.unwrap_or(0));

    Segment {
        departure_time,
        departure_date,
        arrival_time,
        arrival_date,
        origin: place(raw.source.as_ref()),
        destination: place(raw.destination.as_ref()),
        duration: format_duration(duration_minutes),
        duration_minutes,
        carrier: raw.carrier_name().to_string(),
        carrier_code: raw.carrier_code().to_string(),
        flight_number: raw.flight_number().to_string(),
        cabin_class: raw.cabin_class.clone(),
    }
}

fn gap_minutes(arrival: Option<NaiveDateTime>, departure: Option<NaiveDateTime>) -> u32 {
    match (arrival, departure) {
        (Some(a), Some(d)) => {
            let minutes = (d - a).num_minutes().max(0);
            u32::try_from(minutes).unwrap_or(u32::MAX)
        }
        _ => 0,
    }
}

/// Flattens one upstream sector into a [`Leg`].
pub fn normalize_sector(raw: Option<&RawSector>, opts: &NormalizeOptions) -> Leg {
    let Some(sector) = raw else {
        return Leg::empty();
    };

    let raw_segments: Vec<(&RawSegment, Option<u64>)> = sector
        .sector_segments
        .iter()
        .filter_map(|ss| {
            ss.segment
                .as_ref()
                .map(|seg| (seg, ss.layover.as_ref().and_then(|l| l.duration)))
        })
        .collect();

    let (Some((first, _)), Some((last, _))) = (raw_segments.first(), raw_segments.last()) else {
        return Leg::empty();
    };

    let departure = timestamp(first.source.as_ref());
    let arrival = timestamp(last.destination.as_ref());
    let (departure_time, departure_date) = clock_and_date(departure.as_ref());
    let (arrival_time, arrival_date) = clock_and_date(arrival.as_ref());

    let is_overnight = match (departure, arrival) {
        (Some(d), Some(a)) => d.date() != a.date(),
        _ => false,
    };

    let segments: Vec<Segment> = raw_segments
        .iter()
        .map(|(seg, _)| normalize_segment(seg))
        .collect();

    let layovers: Vec<Layover> = raw_segments
        .windows(2)
        .map(|pair| {
            let (current, explicit) = pair[0];
            let (next, _) = pair[1];
            let duration_minutes = match explicit {
                Some(seconds) => seconds_to_minutes(seconds),
                None => gap_minutes(
                    timestamp(current.destination.as_ref()),
                    timestamp(next.source.as_ref()),
                ),
            };
            Layover {
                airport: place(current.destination.as_ref()),
                duration: format_duration(duration_minutes),
                duration_minutes,
            }
        })
        .collect();

    let stop_airports: Vec<String> = segments[..segments.len() - 1]
        .iter()
        .map(|s| s.destination.name.clone())
        .collect();

    let duration_minutes = seconds_to_minutes(sector.duration.unwrap_or(0));
    let carrier_code = first.carrier_code().to_string();

    Leg {
        departure_time,
        departure_date,
        arrival_time,
        arrival_date,
        duration: format_duration(duration_minutes),
        duration_minutes,
        origin: place(first.source.as_ref()),
        destination: place(last.destination.as_ref()),
        carrier: first.carrier_name().to_string(),
        carrier_logo: opts.logo_url(&carrier_code),
        carrier_code,
        stops: u32::try_from(segments.len() - 1).unwrap_or(u32::MAX),
        stop_airports,
        is_overnight,
        segments,
        layovers,
    }
}

fn as_count(value: Option<u64>) -> u32 {
    value.map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX))
}

pub fn normalize_baggage(raw: Option<&RawBagsInfo>) -> BaggageInfo {
    let Some(bags) = raw else {
        return BaggageInfo::default();
    };

    let cabin_bag_included = as_count(bags.included_hand_bags);
    let checked_bag_included = as_count(bags.included_checked_bags);
    let first_price = |tiers: &[crate::raw::RawBagTier]| {
        tiers
            .iter()
            .find_map(|t| t.tier_price.as_ref().and_then(|p| p.amount))
    };

    BaggageInfo {
        cabin_bag_included,
        checked_bag_included,
        personal_item_included: bags.included_personal_item.unwrap_or(0) > 0,
        cabin_bag_options: u32::try_from(bags.hand_bag_tiers.len()).unwrap_or(u32::MAX),
        checked_bag_options: u32::try_from(bags.checked_bag_tiers.len()).unwrap_or(u32::MAX),
        cabin_bag_price: if cabin_bag_included == 0 {
            first_price(&bags.hand_bag_tiers)
        } else {
            None
        },
        checked_bag_price: if checked_bag_included == 0 {
            first_price(&bags.checked_bag_tiers)
        } else {
            None
        },
    }
}

/// Builds a [`Flight`]. The inbound leg is only produced for round trips
/// whose record actually carries one. Tags are left empty.
pub fn normalize_itinerary(
    raw: &RawItinerary,
    is_round_trip: bool,
    opts: &NormalizeOptions,
) -> Flight {
    let outbound = normalize_sector(raw.outbound(), opts);
    let inbound = if is_round_trip {
        raw.inbound().map(|s| normalize_sector(Some(s), opts))
    } else {
        None
    };

    let id = raw
        .upstream_id()
        .map(String::from)
        .unwrap_or_else(|| dedup::fallback_id(raw));

    let hack = raw.travel_hack.clone().unwrap_or_default();
    let booking_url = raw
        .booking_options
        .as_ref()
        .and_then(|b| b.first_url())
        .map(|u| opts.booking_url(u))
        .unwrap_or_default();

    Flight {
        id,
        price: raw.price.unwrap_or(0.0),
        currency: opts.currency.clone(),
        outbound,
        inbound,
        tags: Vec::new(),
        baggage: normalize_baggage(raw.bags_info.as_ref()),
        booking_url,
        is_self_transfer: hack.is_self_transfer,
        is_virtual_interlining: hack.is_virtual_interlining,
    }
}

/// Normalizes every itinerary in order.
pub fn normalize_all(raw: &[RawItinerary], is_round_trip: bool, opts: &NormalizeOptions) -> Vec<Flight> {
    raw.iter()
        .map(|it| normalize_itinerary(it, is_round_trip, opts))
        .collect()
}
