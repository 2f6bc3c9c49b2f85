//! Wire types for the upstream search API.
//!
//! The API returns itineraries in two shapes (`outbound`/`inbound` for
//! round trips, `sector` for one-way) inside either an `itineraries` or a
//! legacy `data` envelope. Both are resolved here, at decode time, into a
//! single canonical [`RawItinerary`] so the rest of the pipeline never
//! branches on wire shape.
//!
//! Decoding is lenient: nested blocks with an unexpected JSON type decode
//! as absent instead of failing the whole record.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FlightError;

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts a string or a number and keeps its textual form.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts `"442.00"` or `442`.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Number(n) => n.as_f64(),
        _ => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(false))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMoney {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCity {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<RawCity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEndpoint {
    #[serde(default, deserialize_with = "lenient_text")]
    pub local_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub station: Option<RawStation>,
}

impl RawEndpoint {
    pub fn code(&self) -> &str {
        self.station
            .as_ref()
            .and_then(|s| s.code.as_deref())
            .unwrap_or("")
    }

    pub fn city(&self) -> &str {
        self.station
            .as_ref()
            .and_then(|s| s.city.as_ref())
            .and_then(|c| c.name.as_deref())
            .unwrap_or("")
    }

    pub fn local_time(&self) -> &str {
        self.local_time.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCarrier {
    #[serde(default, deserialize_with = "lenient_text")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSegment {
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<RawEndpoint>,
    #[serde(default, deserialize_with = "lenient")]
    pub destination: Option<RawEndpoint>,
    #[serde(default, deserialize_with = "lenient")]
    pub carrier: Option<RawCarrier>,
    /// Flight number without the carrier prefix.
    #[serde(default, deserialize_with = "lenient_text")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cabin_class: Option<String>,
}

impl RawSegment {
    pub fn carrier_code(&self) -> &str {
        self.carrier
            .as_ref()
            .and_then(|c| c.code.as_deref())
            .unwrap_or("")
    }

    pub fn carrier_name(&self) -> &str {
        self.carrier
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .unwrap_or("")
    }

    pub fn flight_number(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLayover {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSectorSegment {
    #[serde(default, deserialize_with = "lenient")]
    pub segment: Option<RawSegment>,
    #[serde(default, deserialize_with = "lenient")]
    pub layover: Option<RawLayover>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSector {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub sector_segments: Vec<RawSectorSegment>,
}

impl RawSector {
    /// Segments that actually carry a `segment` body.
    pub fn segments(&self) -> impl Iterator<Item = &RawSegment> {
        self.sector_segments.iter().filter_map(|s| s.segment.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBagTier {
    #[serde(default, deserialize_with = "lenient")]
    pub tier_price: Option<RawMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBagsInfo {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub included_hand_bags: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub included_checked_bags: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub included_personal_item: Option<u64>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub hand_bag_tiers: Vec<RawBagTier>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub checked_bag_tiers: Vec<RawBagTier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTravelHack {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_self_transfer: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_virtual_interlining: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_throwaway_ticket: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_true_hidden_city: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBookingNode {
    #[serde(default, deserialize_with = "lenient_text")]
    pub booking_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBookingEdge {
    #[serde(default, deserialize_with = "lenient")]
    pub node: Option<RawBookingNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBookingOptions {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub edges: Vec<RawBookingEdge>,
}

impl RawBookingOptions {
    pub fn first_url(&self) -> Option<&str> {
        self.edges
            .iter()
            .filter_map(|e| e.node.as_ref())
            .find_map(|n| n.booking_url.as_deref())
    }
}

/// Which legs an itinerary carries, resolved from the wire shape.
#[derive(Debug, Clone, Default)]
pub enum ItineraryShape {
    RoundTrip {
        outbound: RawSector,
        inbound: Option<RawSector>,
    },
    OneWay {
        sector: RawSector,
    },
    #[default]
    Missing,
}

/// One upstream itinerary in canonical form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "WireItinerary")]
pub struct RawItinerary {
    pub id: Option<String>,
    pub legacy_id: Option<String>,
    pub price: Option<f64>,
    pub shape: ItineraryShape,
    pub bags_info: Option<RawBagsInfo>,
    pub travel_hack: Option<RawTravelHack>,
    pub booking_options: Option<RawBookingOptions>,
}

impl RawItinerary {
    /// `id`, falling back to `legacyId`.
    pub fn upstream_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.legacy_id.as_deref())
    }

    pub fn outbound(&self) -> Option<&RawSector> {
        match &self.shape {
            ItineraryShape::RoundTrip { outbound, .. } => Some(outbound),
            ItineraryShape::OneWay { sector } => Some(sector),
            ItineraryShape::Missing => None,
        }
    }

    pub fn inbound(&self) -> Option<&RawSector> {
        match &self.shape {
            ItineraryShape::RoundTrip { inbound, .. } => inbound.as_ref(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItinerary {
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    legacy_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    price: Option<RawMoney>,
    #[serde(default, deserialize_with = "lenient")]
    outbound: Option<RawSector>,
    #[serde(default, deserialize_with = "lenient")]
    inbound: Option<RawSector>,
    #[serde(default, deserialize_with = "lenient")]
    sector: Option<RawSector>,
    #[serde(default, deserialize_with = "lenient")]
    bags_info: Option<RawBagsInfo>,
    #[serde(default, deserialize_with = "lenient")]
    travel_hack: Option<RawTravelHack>,
    #[serde(default, deserialize_with = "lenient")]
    booking_options: Option<RawBookingOptions>,
}

impl From<WireItinerary> for RawItinerary {
    fn from(wire: WireItinerary) -> Self {
        let shape = match (wire.outbound, wire.sector) {
            (Some(outbound), _) => ItineraryShape::RoundTrip {
                outbound,
                inbound: wire.inbound,
            },
            (None, Some(sector)) => ItineraryShape::OneWay { sector },
            (None, None) => ItineraryShape::Missing,
        };

        Self {
            id: wire.id,
            legacy_id: wire.legacy_id,
            price: wire.price.and_then(|p| p.amount),
            shape,
            bags_info: wire.bags_info,
            travel_hack: wire.travel_hack,
            booking_options: wire.booking_options,
        }
    }
}

/// Decoded search response.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub currency: Option<String>,
    pub itineraries: Vec<RawItinerary>,
}

/// Decodes a search response body, accepting both `itineraries` and
/// `data` envelopes. Records that are not objects are skipped.
///
/// # Errors
///
/// Returns [`FlightError::Decode`] when the body is not JSON or carries
/// neither envelope.
pub fn decode_response(body: &str) -> Result<RawResponse, FlightError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FlightError::Decode(e.to_string()))?;

    let currency = value
        .get("currency")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(String::from);

    let items = value
        .get("itineraries")
        .and_then(Value::as_array)
        .or_else(|| value.get("data").and_then(Value::as_array))
        .or_else(|| value.as_array())
        .ok_or_else(|| {
            FlightError::Decode("response has neither 'itineraries' nor 'data' array".into())
        })?;

    let mut itineraries = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match serde_json::from_value::<RawItinerary>(item.clone()) {
            Ok(it) => itineraries.push(it),
            Err(e) => tracing::warn!(index = idx, error = %e, "skipping undecodable itinerary"),
        }
    }

    Ok(RawResponse {
        currency,
        itineraries,
    })
}
