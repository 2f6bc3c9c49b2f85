use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::config::CurrencySymbols;
use crate::model::{Flight, Leg};
use crate::timefmt::format_duration;

fn leg_cell(leg: &Leg) -> String {
    if leg.is_empty() {
        return "—".to_string();
    }
    let overnight = if leg.is_overnight { " +1" } else { "" };
    format!(
        "{} {} → {} {}{overnight}\n{} {}",
        leg.origin.code,
        leg.departure_time,
        leg.destination.code,
        leg.arrival_time,
        leg.departure_date,
        leg.carrier,
    )
}

fn stops_cell(leg: &Leg) -> String {
    if leg.is_empty() {
        "—".to_string()
    } else if leg.stops == 0 {
        "Nonstop".to_string()
    } else {
        let layovers: Vec<String> = leg
            .layovers
            .iter()
            .map(|l| format!("{} {}", l.airport.code, l.duration))
            .collect();
        format!("{} ({})", leg.stops, layovers.join(", "))
    }
}

pub fn bags_cell(flight: &Flight) -> String {
    let b = &flight.baggage;
    format!("{} cabin / {} checked", b.cabin_bag_included, b.checked_bag_included)
}

pub fn render(flights: &[Flight], symbols: &CurrencySymbols) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Tags", "Outbound", "Stops", "Return", "Stops", "Duration", "Bags", "Price",
        ]);

    for flight in flights {
        let tags: Vec<&str> = flight.tags.iter().map(|t| t.label()).collect();

        let (inbound, inbound_stops) = match flight.inbound {
            Some(ref leg) => (leg_cell(leg), stops_cell(leg)),
            None => ("—".to_string(), "—".to_string()),
        };

        let mut price = symbols.format_price(flight.price, &flight.currency);
        if flight.is_self_transfer {
            price.push_str("\nself-transfer");
        }

        table.add_row(vec![
            tags.join("\n"),
            leg_cell(&flight.outbound),
            stops_cell(&flight.outbound),
            inbound,
            inbound_stops,
            format_duration(flight.total_duration_minutes()),
            bags_cell(flight),
            price,
        ]);
    }

    table.to_string()
}

/// One line per flight, for scripts and agents.
pub fn compact_line(flight: &Flight, symbols: &CurrencySymbols) -> String {
    let price = symbols.format_price(flight.price, &flight.currency);

    let leg_summary = |leg: &Leg| -> String {
        if leg.is_empty() {
            return "—".to_string();
        }
        let route: Vec<&str> = std::iter::once(leg.origin.code.as_str())
            .chain(leg.segments.iter().map(|s| s.destination.code.as_str()))
            .collect();
        format!(
            "{} {} {}>{} {}",
            route.join(">"),
            leg.departure_date,
            leg.departure_time,
            leg.arrival_time,
            leg.duration
        )
    };

    let mut parts = vec![price, leg_summary(&flight.outbound)];
    if let Some(ref inbound) = flight.inbound {
        parts.push(leg_summary(inbound));
    }
    parts.push(match flight.max_stops() {
        0 => "nonstop".to_string(),
        n => format!("{n} stop"),
    });
    parts.push(flight.outbound.carrier.clone());
    if !flight.tags.is_empty() {
        let tags: Vec<&str> = flight.tags.iter().map(|t| t.label()).collect();
        parts.push(tags.join(","));
    }
    parts.join(" | ")
}
