use quikwing::normalize::{normalize_baggage, normalize_itinerary, normalize_sector, NormalizeOptions};
use quikwing::raw::{RawItinerary, RawSector};
use serde_json::{json, Value};

fn endpoint(code: &str, city: &str, time: &str) -> Value {
    json!({"localTime": time, "station": {"code": code, "city": {"name": city}}})
}

fn segment(from: (&str, &str, &str), to: (&str, &str, &str), carrier: (&str, &str), number: &str, secs: u64) -> Value {
    json!({
        "source": endpoint(from.0, from.1, from.2),
        "destination": endpoint(to.0, to.1, to.2),
        "carrier": {"code": carrier.0, "name": carrier.1},
        "code": number,
        "duration": secs,
        "cabinClass": "ECONOMY",
    })
}

fn sector(secs: u64, parts: Vec<Value>) -> Value {
    json!({"duration": secs, "sectorSegments": parts})
}

/// BER -> FRA (explicit 90 min layover) -> EWR.
fn ber_ewr_outbound() -> Value {
    sector(
        11 * 3600 + 30 * 60,
        vec![
            json!({
                "segment": segment(
                    ("BER", "Berlin", "2026-04-01T07:00:00"),
                    ("FRA", "Frankfurt", "2026-04-01T08:10:00"),
                    ("LH", "Lufthansa"),
                    "171",
                    70 * 60,
                ),
                "layover": {"duration": 90 * 60},
            }),
            json!({
                "segment": segment(
                    ("FRA", "Frankfurt", "2026-04-01T09:40:00"),
                    ("EWR", "Newark", "2026-04-01T12:30:00"),
                    ("LH", "Lufthansa"),
                    "400",
                    8 * 3600 + 50 * 60,
                ),
            }),
        ],
    )
}

/// EWR -> MUC (no layover block, gap computed from timestamps) -> BER.
fn ewr_ber_inbound() -> Value {
    sector(
        10 * 3600 + 15 * 60,
        vec![
            json!({
                "segment": segment(
                    ("EWR", "Newark", "2026-04-15T17:45:00"),
                    ("MUC", "Munich", "2026-04-16T07:40:00"),
                    ("UA", "United Airlines"),
                    "30",
                    7 * 3600 + 55 * 60,
                ),
            }),
            json!({
                "segment": segment(
                    ("MUC", "Munich", "2026-04-16T08:45:00"),
                    ("BER", "Berlin", "2026-04-16T10:00:00"),
                    ("LH", "Lufthansa"),
                    "1936",
                    75 * 60,
                ),
            }),
        ],
    )
}

fn round_trip() -> RawItinerary {
    serde_json::from_value(json!({
        "id": "it-442",
        "price": {"amount": "442.00"},
        "outbound": ber_ewr_outbound(),
        "inbound": ewr_ber_inbound(),
        "bagsInfo": {
            "includedHandBags": 1,
            "includedCheckedBags": 0,
            "includedPersonalItem": 1,
            "handBagTiers": [{"tierPrice": {"amount": 0}}],
            "checkedBagTiers": [{"tierPrice": {"amount": "39.5"}}, {"tierPrice": {"amount": 70}}],
        },
        "travelHack": {"isSelfTransfer": true, "isVirtualInterlining": false},
        "bookingOptions": {"edges": [{"node": {"bookingUrl": "/en/booking?token=abc"}}]},
    }))
    .unwrap()
}

fn raw_sector(value: Value) -> RawSector {
    serde_json::from_value(value).unwrap()
}

#[test]
fn round_trip_flight_is_fully_normalized() {
    let opts = NormalizeOptions {
        currency: "USD".into(),
        ..NormalizeOptions::default()
    };
    let flight = normalize_itinerary(&round_trip(), true, &opts);

    assert_eq!(flight.id, "it-442");
    assert_eq!(flight.price, 442.0);
    assert_eq!(flight.currency, "USD");
    assert!(flight.tags.is_empty());
    assert!(flight.is_self_transfer);
    assert!(!flight.is_virtual_interlining);
    assert_eq!(flight.booking_url, "https://www.kiwi.com/en/booking?token=abc");

    let out = &flight.outbound;
    assert_eq!(out.origin.code, "BER");
    assert_eq!(out.origin.name, "Berlin");
    assert_eq!(out.destination.code, "EWR");
    assert_eq!(out.departure_time, "07:00");
    assert_eq!(out.departure_date, "2026-04-01");
    assert_eq!(out.arrival_time, "12:30");
    assert_eq!(out.duration, "11h 30m");
    assert_eq!(out.duration_minutes, 690);
    assert_eq!(out.stops, 1);
    assert_eq!(out.stop_airports, vec!["Frankfurt"]);
    assert_eq!(out.carrier, "Lufthansa");
    assert_eq!(out.carrier_code, "LH");
    assert_eq!(out.carrier_logo, "https://images.kiwi.com/airlines/64/LH.png");
    assert!(!out.is_overnight);
    assert_eq!(out.layovers.len(), 1);
    assert_eq!(out.layovers[0].airport.code, "FRA");
    assert_eq!(out.layovers[0].duration_minutes, 90);
    assert_eq!(out.layovers[0].duration, "1h 30m");
    assert_eq!(out.segments[1].flight_number, "400");
    assert_eq!(out.segments[1].duration, "8h 50m");

    let inbound = flight.inbound.as_ref().expect("inbound leg");
    assert_eq!(inbound.origin.code, "EWR");
    assert_eq!(inbound.destination.code, "BER");
    assert!(inbound.is_overnight);
    assert_eq!(inbound.arrival_date, "2026-04-16");
    assert_eq!(inbound.layovers[0].airport.code, "MUC");
    assert_eq!(inbound.layovers[0].duration_minutes, 65);
    assert_eq!(inbound.carrier, "United Airlines");

    assert_eq!(flight.total_duration_minutes(), 690 + 615);
    assert_eq!(flight.total_stops(), 2);
}

#[test]
fn segment_and_layover_counts_line_up() {
    let leg = normalize_sector(Some(&raw_sector(ber_ewr_outbound())), &NormalizeOptions::default());
    assert_eq!(leg.stops as usize, leg.segments.len() - 1);
    assert_eq!(leg.layovers.len(), leg.segments.len() - 1);
    assert_eq!(leg.stop_airports.len(), leg.stops as usize);
    assert_eq!(leg.origin, leg.segments[0].origin);
    assert_eq!(leg.destination, leg.segments.last().unwrap().destination);
}

#[test]
fn single_segment_is_direct() {
    let value = sector(
        2 * 3600,
        vec![json!({
            "segment": segment(
                ("LHR", "London", "2026-05-01T10:00:00"),
                ("CDG", "Paris", "2026-05-01T12:00:00"),
                ("AF", "Air France"),
                "1081",
                3600,
            ),
        })],
    );
    let leg = normalize_sector(Some(&raw_sector(value)), &NormalizeOptions::default());
    assert_eq!(leg.stops, 0);
    assert!(leg.layovers.is_empty());
    assert!(leg.stop_airports.is_empty());
    assert_eq!(leg.duration, "2h 00m");
}

#[test]
fn missing_or_empty_sector_is_empty_leg() {
    let opts = NormalizeOptions::default();
    assert!(normalize_sector(None, &opts).is_empty());
    let empty = normalize_sector(Some(&raw_sector(sector(0, vec![]))), &opts);
    assert!(empty.is_empty());
    assert_eq!(empty.stops, 0);
    assert_eq!(empty.departure_time, "");
}

#[test]
fn segments_without_body_are_skipped() {
    let value = sector(
        3600,
        vec![
            json!({"layover": {"duration": 600}}),
            json!({
                "segment": segment(
                    ("OSL", "Oslo", "2026-06-01T06:00:00"),
                    ("BGO", "Bergen", "2026-06-01T07:00:00"),
                    ("DY", "Norwegian"),
                    "600",
                    3600,
                ),
            }),
        ],
    );
    let leg = normalize_sector(Some(&raw_sector(value)), &NormalizeOptions::default());
    assert_eq!(leg.segments.len(), 1);
    assert_eq!(leg.stops, 0);
}

#[test]
fn one_way_search_drops_inbound() {
    let flight = normalize_itinerary(&round_trip(), false, &NormalizeOptions::default());
    assert!(flight.inbound.is_none());
    assert_eq!(flight.outbound.destination.code, "EWR");
}

#[test]
fn sector_shape_feeds_outbound() {
    let raw: RawItinerary = serde_json::from_value(json!({
        "id": "ow-1",
        "price": {"amount": 120},
        "sector": ber_ewr_outbound(),
    }))
    .unwrap();
    let flight = normalize_itinerary(&raw, false, &NormalizeOptions::default());
    assert_eq!(flight.outbound.stops, 1);
    assert_eq!(flight.price, 120.0);
}

#[test]
fn record_without_legs_still_normalizes() {
    let raw: RawItinerary = serde_json::from_value(json!({"id": "bare"})).unwrap();
    let flight = normalize_itinerary(&raw, true, &NormalizeOptions::default());
    assert!(flight.outbound.is_empty());
    assert!(flight.inbound.is_none());
    assert_eq!(flight.price, 0.0);
    assert_eq!(flight.booking_url, "");
    assert_eq!(flight.baggage, Default::default());
}

#[test]
fn missing_id_gets_stable_fallback() {
    let raw: RawItinerary = serde_json::from_value(json!({
        "price": {"amount": 99},
        "sector": ber_ewr_outbound(),
    }))
    .unwrap();
    let a = normalize_itinerary(&raw, false, &NormalizeOptions::default());
    let b = normalize_itinerary(&raw.clone(), false, &NormalizeOptions::default());
    assert!(a.id.starts_with("fp-"));
    assert_eq!(a.id, b.id);
}

#[test]
fn legacy_id_is_used_when_id_missing() {
    let raw: RawItinerary = serde_json::from_value(json!({"legacyId": "old-7"})).unwrap();
    let flight = normalize_itinerary(&raw, false, &NormalizeOptions::default());
    assert_eq!(flight.id, "old-7");
}

#[test]
fn baggage_counts_and_prices() {
    let bags = normalize_baggage(round_trip().bags_info.as_ref());
    assert_eq!(bags.cabin_bag_included, 1);
    assert_eq!(bags.checked_bag_included, 0);
    assert!(bags.personal_item_included);
    assert_eq!(bags.cabin_bag_options, 1);
    assert_eq!(bags.checked_bag_options, 2);
    assert_eq!(bags.cabin_bag_price, None);
    assert_eq!(bags.checked_bag_price, Some(39.5));
    assert!(bags.any_included());
}

#[test]
fn absolute_booking_url_is_kept_and_logo_template_applies() {
    let opts = NormalizeOptions {
        currency: "EUR".into(),
        logo_url_template: "https://logos.test/{code}.svg".into(),
        booking_base_url: "https://book.test/".into(),
    };
    assert_eq!(opts.booking_url("https://other.test/x"), "https://other.test/x");
    assert_eq!(opts.booking_url("deep/link"), "https://book.test/deep/link");
    assert_eq!(opts.logo_url("UA"), "https://logos.test/UA.svg");
    assert_eq!(opts.logo_url(""), "");
}

#[test]
fn two_segment_outbound_with_direct_return() {
    let inbound = sector(
        8 * 3600,
        vec![json!({
            "segment": segment(
                ("EWR", "Newark", "2026-04-15T18:00:00"),
                ("BER", "Berlin", "2026-04-16T08:00:00"),
                ("UA", "United Airlines"),
                "962",
                8 * 3600,
            ),
        })],
    );
    let raw: RawItinerary = serde_json::from_value(json!({
        "id": "rt-1",
        "price": {"amount": "442.00"},
        "outbound": ber_ewr_outbound(),
        "inbound": inbound,
    }))
    .unwrap();

    let flight = normalize_itinerary(&raw, true, &NormalizeOptions::default());
    assert_eq!(flight.price, 442.0);
    assert_eq!(flight.outbound.stops, 1);
    assert_eq!(flight.outbound.layovers[0].duration_minutes, 90);
    let inbound = flight.inbound.unwrap();
    assert_eq!(inbound.stops, 0);
    assert!(inbound.layovers.is_empty());
    assert!(inbound.is_overnight);
}

#[test]
fn overnight_compares_calendar_dates() {
    let opts = NormalizeOptions::default();
    let leg = |departs: &str, arrives: &str| {
        let value = sector(
            3600,
            vec![json!({
                "segment": segment(
                    ("SYD", "Sydney", departs),
                    ("LAX", "Los Angeles", arrives),
                    ("QF", "Qantas"),
                    "11",
                    3600,
                ),
            })],
        );
        normalize_sector(Some(&raw_sector(value)), &opts)
    };

    assert!(!leg("2026-04-01T08:00:00", "2026-04-01T23:59:00").is_overnight);
    assert!(leg("2026-04-01T22:00:00", "2026-04-02T06:00:00").is_overnight);
    assert!(leg("2026-03-31T22:00:00", "2026-04-01T06:00:00").is_overnight);
    // Same day of month, different month.
    assert!(leg("2026-04-01T22:00:00", "2026-05-01T06:00:00").is_overnight);
}
