use chrono::NaiveDate;

use crate::config::{ONE_WAY_PATH, ROUND_TRIP_PATH};
use crate::error::FlightError;
use crate::filter::FilterState;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_PASSENGERS: u32 = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn from_str_loose(s: &str) -> Result<Self, FlightError> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "economy" => Ok(Self::Economy),
            "premium-economy" | "economy-premium" => Ok(Self::PremiumEconomy),
            "business" => Ok(Self::Business),
            "first" | "first-class" => Ok(Self::First),
            _ => Err(FlightError::Validation(format!("invalid cabin class: {s}"))),
        }
    }

    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Economy => "ECONOMY",
            Self::PremiumEconomy => "ECONOMY_PREMIUM",
            Self::Business => "BUSINESS",
            Self::First => "FIRST_CLASS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripType {
    RoundTrip,
    OneWay,
}

impl TripType {
    pub fn path(self) -> &'static str {
        match self {
            Self::RoundTrip => ROUND_TRIP_PATH,
            Self::OneWay => ONE_WAY_PATH,
        }
    }
}

/// Form state for one search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub source: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub adults: u32,
    pub cabin: CabinClass,
    pub currency: String,
    pub limit: u32,
}

impl SearchRequest {
    pub fn new(source: &str, destination: &str, departure_date: &str) -> Self {
        Self {
            source: normalize_location(source),
            destination: normalize_location(destination),
            departure_date: departure_date.trim().to_string(),
            return_date: None,
            adults: 1,
            cabin: CabinClass::Economy,
            currency: "USD".into(),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Round trip exactly when a return date is present.
    pub fn trip(&self) -> TripType {
        if self.return_date.is_some() {
            TripType::RoundTrip
        } else {
            TripType::OneWay
        }
    }

    pub fn is_round_trip(&self) -> bool {
        self.trip() == TripType::RoundTrip
    }

    pub fn validate(&self) -> Result<(), FlightError> {
        validate_airport(&self.source)?;
        validate_airport(&self.destination)?;
        if self.source == self.destination {
            return Err(FlightError::Validation(
                "origin and destination must differ".into(),
            ));
        }

        let departure = parse_date(&self.departure_date)?;
        if let Some(ref ret) = self.return_date {
            let back = parse_date(ret)?;
            if back < departure {
                return Err(FlightError::Validation(format!(
                    "return date {ret} is before departure date {}",
                    self.departure_date
                )));
            }
        }

        if self.adults == 0 {
            return Err(FlightError::Validation(
                "at least one passenger required".into(),
            ));
        }
        if self.adults > MAX_PASSENGERS {
            return Err(FlightError::Validation(format!(
                "total passengers ({}) exceeds maximum of {MAX_PASSENGERS}",
                self.adults
            )));
        }

        if self.limit == 0 {
            return Err(FlightError::Validation("--limit must be at least 1".into()));
        }

        Ok(())
    }

    /// Query string for the upstream search endpoint. Filters that the API
    /// can apply itself are forwarded; the rest are enforced locally.
    pub fn to_url_params(&self, filters: &FilterState) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("source".into(), self.source.clone()),
            ("destination".into(), self.destination.clone()),
            ("adults".into(), self.adults.to_string()),
            ("cabin_class".into(), self.cabin.as_api_str().into()),
            ("limit".into(), self.limit.to_string()),
        ];

        if !self.currency.is_empty() {
            params.push(("currency".into(), self.currency.clone()));
        }

        match self.return_date {
            Some(ref ret) => {
                params.push((
                    "outbound_department_date_start".into(),
                    self.departure_date.clone(),
                ));
                params.push((
                    "outbound_department_date_end".into(),
                    self.departure_date.clone(),
                ));
                params.push(("inbound_departure_date_start".into(), ret.clone()));
                params.push(("inbound_departure_date_end".into(), ret.clone()));
            }
            None => {
                params.push(("departure_date_start".into(), self.departure_date.clone()));
                params.push(("departure_date_end".into(), self.departure_date.clone()));
            }
        }

        params.push(("price_end".into(), format!("{}", filters.max_price.round() as i64)));

        if let Some(max_stops) = filters.stops.max_stops() {
            params.push(("max_stops_count".into(), max_stops.to_string()));
        }

        params.push((
            "allow_overnight_stopover".into(),
            filters.stops.allow_overnight.to_string(),
        ));
        params.push(("handbags".into(), filters.bags.cabin.to_string()));
        params.push(("holdbags".into(), filters.bags.checked.to_string()));
        params.push((
            "enable_self_transfer".into(),
            filters.travel_hacks.self_transfer.to_string(),
        ));
        params.push((
            "enable_throw_away_ticketing".into(),
            filters.travel_hacks.throwaway_ticketing.to_string(),
        ));
        params.push((
            "enable_true_hidden_city".into(),
            filters.travel_hacks.hidden_cities.to_string(),
        ));

        params
    }
}

fn is_iata(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// IATA codes are uppercased; `Kind:id` location ids are passed through
/// untouched since their ids are case-sensitive upstream.
fn normalize_location(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_iata(trimmed) {
        trimmed.to_ascii_uppercase()
    } else {
        trimmed.to_string()
    }
}

/// `BER`, or a location id such as `City:london_gb` / `Country:GB`.
fn validate_airport(code: &str) -> Result<(), FlightError> {
    let valid = match code.split_once(':') {
        Some((kind, id)) => {
            !kind.is_empty()
                && kind.chars().all(|c| c.is_ascii_alphabetic())
                && !id.is_empty()
                && !id.contains(':')
                && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        None => is_iata(code) && code.chars().all(|c| c.is_ascii_uppercase()),
    };
    if !valid {
        return Err(FlightError::InvalidAirport(code.to_string()));
    }
    Ok(())
}

fn parse_date(date: &str) -> Result<NaiveDate, FlightError> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| FlightError::InvalidDate(date.to_string()))?;
    if parsed.format("%Y-%m-%d").to_string() != date {
        return Err(FlightError::InvalidDate(date.to_string()));
    }
    if parsed < NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN) {
        return Err(FlightError::InvalidDate(date.to_string()));
    }
    Ok(parsed)
}
