//! User-selected constraints and the local predicate evaluator.
//!
//! Some fields (`exclude_countries`, the travel hacks, overnight stopover
//! allowance) only shape the upstream request; locally they are treated as
//! already satisfied.

use serde::{Deserialize, Serialize};

use crate::error::FlightError;
use crate::model::{Flight, Leg};
use crate::timefmt::{clock_to_minutes, parse_weekday, weekday_index};

pub const MINUTES_PER_DAY: u32 = 1440;
/// Top of the stopover slider; a range reaching it has no upper cap.
pub const MAX_STOPOVER_MINUTES: u32 = 1500;

/// Inclusive range in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    pub const FULL_DAY: Self = Self {
        start: 0,
        end: MINUTES_PER_DAY,
    };

    pub fn contains(&self, minutes: u32) -> bool {
        (self.start..=self.end).contains(&minutes)
    }

    pub fn is_full_day(&self) -> bool {
        self.start == 0 && self.end >= MINUTES_PER_DAY
    }

    pub const STOPOVER_DEFAULT: Self = Self {
        start: 0,
        end: MAX_STOPOVER_MINUTES,
    };

    /// Whether a stopover range still admits any layover length.
    pub fn is_unbounded_stopover(&self) -> bool {
        self.start == 0 && self.end >= MAX_STOPOVER_MINUTES
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BagsFilter {
    pub cabin: u32,
    pub checked: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StopsFilter {
    pub any: bool,
    pub direct: bool,
    pub up_to_1: bool,
    pub up_to_2: bool,
    pub allow_overnight: bool,
}

impl Default for StopsFilter {
    fn default() -> Self {
        Self {
            any: true,
            direct: false,
            up_to_1: false,
            up_to_2: false,
            allow_overnight: true,
        }
    }
}

impl StopsFilter {
    /// Loosest threshold among the checked buckets, or `None` when no
    /// bucket is checked.
    pub fn max_stops(&self) -> Option<u32> {
        [(self.up_to_2, 2), (self.up_to_1, 1), (self.direct, 0)]
            .into_iter()
            .find_map(|(checked, limit)| checked.then_some(limit))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionsFilter {
    pub self_transfer: bool,
    pub return_diff_station: bool,
    pub return_to_diff_station: bool,
}

impl Default for ConnectionsFilter {
    fn default() -> Self {
        Self {
            self_transfer: true,
            return_diff_station: true,
            return_to_diff_station: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TravelHacks {
    pub self_transfer: bool,
    pub throwaway_ticketing: bool,
    pub hidden_cities: bool,
}

impl Default for TravelHacks {
    fn default() -> Self {
        Self {
            self_transfer: true,
            throwaway_ticketing: true,
            hidden_cities: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeWindows {
    pub departure: TimeRange,
    pub arrival: TimeRange,
}

impl Default for TimeWindows {
    fn default() -> Self {
        Self {
            departure: TimeRange::FULL_DAY,
            arrival: TimeRange::FULL_DAY,
        }
    }
}

/// Weekday allow-lists, 0 = Monday .. 6 = Sunday. Empty means any day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DayFilter {
    pub departure: Vec<u8>,
    #[serde(rename = "return")]
    pub return_days: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub price_alerts: bool,
    pub bags: BagsFilter,
    pub stops: StopsFilter,
    pub connections: ConnectionsFilter,
    pub carriers: Vec<String>,
    pub travel_hacks: TravelHacks,
    pub exclude_countries: Vec<String>,
    pub times: TimeWindows,
    /// Per-leg cap in minutes.
    pub max_duration: Option<u32>,
    pub stopover_duration: TimeRange,
    pub max_price: f64,
    pub days: DayFilter,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            price_alerts: false,
            bags: BagsFilter::default(),
            stops: StopsFilter::default(),
            connections: ConnectionsFilter::default(),
            carriers: Vec::new(),
            travel_hacks: TravelHacks::default(),
            exclude_countries: Vec::new(),
            times: TimeWindows::default(),
            max_duration: None,
            stopover_duration: TimeRange::STOPOVER_DEFAULT,
            max_price: 3000.0,
            days: DayFilter::default(),
        }
    }
}

fn price_ok(flight: &Flight, filters: &FilterState) -> bool {
    flight.price <= filters.max_price
}

fn stops_ok(flight: &Flight, filters: &FilterState) -> bool {
    match filters.stops.max_stops() {
        Some(limit) => flight.max_stops() <= limit,
        None => true,
    }
}

fn carrier_matches(leg: &Leg, wanted: &str) -> bool {
    (!leg.carrier.is_empty() && leg.carrier.eq_ignore_ascii_case(wanted))
        || (!leg.carrier_code.is_empty() && leg.carrier_code.eq_ignore_ascii_case(wanted))
}

fn carriers_ok(flight: &Flight, filters: &FilterState) -> bool {
    if filters.carriers.is_empty() {
        return true;
    }
    filters.carriers.iter().any(|wanted| {
        let wanted = wanted.trim();
        flight.legs().any(|leg| carrier_matches(leg, wanted))
    })
}

fn duration_ok(flight: &Flight, filters: &FilterState) -> bool {
    match filters.max_duration {
        Some(cap) => flight.legs().all(|leg| leg.duration_minutes <= cap),
        None => true,
    }
}

fn clock_in(range: &TimeRange, clock: &str) -> bool {
    if range.is_full_day() {
        return true;
    }
    clock_to_minutes(clock).is_some_and(|m| range.contains(m))
}

fn times_ok(flight: &Flight, filters: &FilterState) -> bool {
    clock_in(&filters.times.departure, &flight.outbound.departure_time)
        && clock_in(&filters.times.arrival, &flight.outbound.arrival_time)
}

fn bags_ok(flight: &Flight, filters: &FilterState) -> bool {
    flight.baggage.cabin_bag_included >= filters.bags.cabin
        && flight.baggage.checked_bag_included >= filters.bags.checked
}

fn self_transfer_ok(flight: &Flight, filters: &FilterState) -> bool {
    filters.connections.self_transfer || !flight.is_self_transfer
}

fn stopover_ok(flight: &Flight, filters: &FilterState) -> bool {
    let range = &filters.stopover_duration;
    if range.is_unbounded_stopover() {
        return true;
    }
    let uncapped = range.end >= MAX_STOPOVER_MINUTES;
    flight
        .legs()
        .flat_map(|leg| leg.layovers.iter())
        .all(|l| l.duration_minutes >= range.start && (uncapped || l.duration_minutes <= range.end))
}

fn day_in(allowed: &[u8], date: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }
    weekday_index(date).is_some_and(|d| allowed.contains(&d))
}

fn days_ok(flight: &Flight, filters: &FilterState) -> bool {
    let outbound = day_in(&filters.days.departure, &flight.outbound.departure_date);
    let inbound = flight
        .inbound
        .as_ref()
        .is_none_or(|leg| day_in(&filters.days.return_days, &leg.departure_date));
    outbound && inbound
}

const PREDICATES: &[fn(&Flight, &FilterState) -> bool] = &[
    price_ok,
    stops_ok,
    carriers_ok,
    duration_ok,
    times_ok,
    bags_ok,
    self_transfer_ok,
    stopover_ok,
    days_ok,
];

pub fn matches(flight: &Flight, filters: &FilterState) -> bool {
    PREDICATES.iter().all(|p| p(flight, filters))
}

/// Flights passing every active predicate, in input order.
pub fn apply_filters(flights: &[Flight], filters: &FilterState) -> Vec<Flight> {
    flights
        .iter()
        .filter(|f| matches(f, filters))
        .cloned()
        .collect()
}

/// `"06:00-12:30"` to an inclusive minutes-from-midnight window.
/// `"24:00"` is accepted as the end of the day.
pub fn parse_time_window(s: &str) -> Result<TimeRange, FlightError> {
    let invalid = || FlightError::Validation(format!("invalid time window \"{s}\", expected HH:MM-HH:MM"));
    let (start, end) = s.split_once('-').ok_or_else(invalid)?;
    let to_minutes = |t: &str| -> Option<u32> {
        if t.trim() == "24:00" {
            Some(MINUTES_PER_DAY)
        } else {
            clock_to_minutes(t)
        }
    };
    let start = to_minutes(start).ok_or_else(invalid)?;
    let end = to_minutes(end).ok_or_else(invalid)?;
    if start > end {
        return Err(invalid());
    }
    Ok(TimeRange { start, end })
}

/// Rejects NaN, infinite and negative price caps.
pub fn validate_max_price(amount: f64) -> Result<f64, FlightError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(FlightError::Validation(format!(
            "max price must be a positive amount, got {amount}"
        )));
    }
    Ok(amount)
}

/// `"60-240"` to an inclusive minutes range.
pub fn parse_minute_range(s: &str) -> Result<TimeRange, FlightError> {
    let invalid = || FlightError::Validation(format!("invalid range \"{s}\", expected MIN-MAX in minutes"));
    let (start, end) = s.split_once('-').ok_or_else(invalid)?;
    let start: u32 = start.trim().parse().map_err(|_| invalid())?;
    let end: u32 = end.trim().parse().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid());
    }
    Ok(TimeRange { start, end })
}

/// `"mon,fri"` to sorted, deduplicated weekday indices.
pub fn parse_days(s: &str) -> Result<Vec<u8>, FlightError> {
    let mut days = s
        .split(',')
        .filter(|d| !d.trim().is_empty())
        .map(|d| {
            parse_weekday(d)
                .ok_or_else(|| FlightError::Validation(format!("invalid weekday: {}", d.trim())))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

/// `any`, `direct`/`0`, `1`, `2`.
pub fn parse_stops(s: &str) -> Result<StopsFilter, FlightError> {
    let mut stops = StopsFilter {
        any: false,
        ..StopsFilter::default()
    };
    match s.trim().to_lowercase().as_str() {
        "any" => stops.any = true,
        "direct" | "nonstop" | "0" => stops.direct = true,
        "1" => stops.up_to_1 = true,
        "2" => stops.up_to_2 = true,
        other => {
            return Err(FlightError::Validation(format!(
                "invalid stops value: {other}, expected any, direct, 1 or 2"
            )))
        }
    }
    Ok(stops)
}
