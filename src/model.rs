use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Segment {
    pub departure_time: String,
    pub departure_date: String,
    pub arrival_time: String,
    pub arrival_date: String,
    pub origin: Place,
    pub destination: Place,
    pub duration: String,
    pub duration_minutes: u32,
    pub carrier: String,
    pub carrier_code: String,
    pub flight_number: String,
    pub cabin_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layover {
    pub airport: Place,
    pub duration: String,
    pub duration_minutes: u32,
}

/// One direction of a trip. [`Leg::empty`] is the defined state for a
/// missing or malformed upstream sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Leg {
    pub departure_time: String,
    pub departure_date: String,
    pub arrival_time: String,
    pub arrival_date: String,
    pub duration: String,
    pub duration_minutes: u32,
    pub origin: Place,
    pub destination: Place,
    pub carrier: String,
    pub carrier_code: String,
    pub carrier_logo: String,
    pub stops: u32,
    pub stop_airports: Vec<String>,
    pub is_overnight: bool,
    pub segments: Vec<Segment>,
    pub layovers: Vec<Layover>,
}

impl Leg {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaggageInfo {
    pub cabin_bag_included: u32,
    pub checked_bag_included: u32,
    pub personal_item_included: bool,
    /// Purchasable tiers offered on top of what is included.
    pub cabin_bag_options: u32,
    pub checked_bag_options: u32,
    pub cabin_bag_price: Option<f64>,
    pub checked_bag_price: Option<f64>,
}

impl BaggageInfo {
    pub fn any_included(&self) -> bool {
        self.cabin_bag_included > 0 || self.checked_bag_included > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tag {
    Cheapest,
    Fastest,
    Best,
    Direct,
    #[serde(rename = "Bags Included")]
    BagsIncluded,
}

impl Tag {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cheapest => "Cheapest",
            Self::Fastest => "Fastest",
            Self::Best => "Best",
            Self::Direct => "Direct",
            Self::BagsIncluded => "Bags Included",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Flight {
    pub id: String,
    pub price: f64,
    pub currency: String,
    pub outbound: Leg,
    pub inbound: Option<Leg>,
    pub tags: Vec<Tag>,
    pub baggage: BaggageInfo,
    pub booking_url: String,
    pub is_self_transfer: bool,
    pub is_virtual_interlining: bool,
}

impl Flight {
    pub fn total_duration_minutes(&self) -> u32 {
        self.outbound
            .duration_minutes
            .saturating_add(self.inbound.as_ref().map_or(0, |l| l.duration_minutes))
    }

    pub fn total_stops(&self) -> u32 {
        self.outbound
            .stops
            .saturating_add(self.inbound.as_ref().map_or(0, |l| l.stops))
    }

    /// Most stops on either leg.
    pub fn max_stops(&self) -> u32 {
        self.outbound
            .stops
            .max(self.inbound.as_ref().map_or(0, |l| l.stops))
    }

    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        std::iter::once(&self.outbound).chain(self.inbound.iter())
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Autocomplete entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    #[serde(default)]
    pub id: i64,
    pub iata: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResult {
    pub currency: String,
    pub flights: Vec<Flight>,
}
