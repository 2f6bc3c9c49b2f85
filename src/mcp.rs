use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::Deserialize;

use crate::config::Config;
use crate::error::FlightError;
use crate::fetch::ApiClient;
use crate::filter::{self, FilterState};
use crate::query::{CabinClass, SearchRequest};
use crate::sort::SortOption;

const MAX_AIRPORTS: usize = 20;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
struct SearchArgs {
    #[schemars(
        description = "Departure: 3-letter IATA code or a location id. Example: BER, JFK, City:london_gb, Country:GB"
    )]
    from: String,
    #[schemars(
        description = "Arrival: 3-letter IATA code or a location id. Example: EWR, City:dubrovnik_hr"
    )]
    to: String,
    #[schemars(description = "Departure date in YYYY-MM-DD format. Example: 2026-03-01")]
    date: String,
    #[schemars(
        description = "Return date in YYYY-MM-DD for round-trip. Omit for one-way"
    )]
    return_date: Option<String>,
    #[schemars(
        description = "One of: economy, premium-economy, business, first. Default: economy"
    )]
    cabin: Option<String>,
    #[schemars(description = "Adult passengers, 1-9. Default: 1")]
    adults: Option<u32>,
    #[schemars(description = "Currency code. Examples: USD, EUR, GBP. Default: configured currency")]
    currency: Option<String>,
    #[schemars(description = "Maximum total price")]
    max_price: Option<f64>,
    #[schemars(description = "Stops allowed: any, direct, 1 or 2. Default: any")]
    stops: Option<String>,
    #[schemars(description = "Only these carriers, codes or names, comma-separated. Example: LH,UA")]
    carriers: Option<String>,
    #[schemars(description = "Maximum duration of each leg in minutes")]
    max_duration: Option<u32>,
    #[schemars(description = "Outbound departure time window. Example: 06:00-12:00")]
    depart_window: Option<String>,
    #[schemars(description = "Minimum included checked bags")]
    checked_bags: Option<u32>,
    #[schemars(description = "Exclude self-transfer itineraries")]
    no_self_transfer: Option<bool>,
    #[schemars(description = "Sort order: best, cheapest or fastest. Default: best")]
    sort: Option<String>,
    #[schemars(description = "Return only the first N results of the sorted list")]
    top: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AirportsArgs {
    #[schemars(description = "Part of an airport name, city or IATA code. Example: berlin")]
    query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct OpenUrlArgs {
    #[schemars(description = "URL to open. Must start with http:// or https://")]
    url: String,
}

fn to_request(args: &SearchArgs, default_currency: &str) -> Result<SearchRequest, FlightError> {
    let mut request = SearchRequest::new(&args.from, &args.to, &args.date);
    request.return_date = args.return_date.clone();
    request.adults = args.adults.unwrap_or(1);
    if let Some(ref cabin) = args.cabin {
        request.cabin = CabinClass::from_str_loose(cabin)?;
    }
    request.currency = args
        .currency
        .as_ref()
        .map_or_else(|| default_currency.to_string(), |c| c.to_uppercase());
    request.validate()?;
    Ok(request)
}

fn to_filters(args: &SearchArgs) -> Result<FilterState, FlightError> {
    let mut filters = FilterState::default();
    if let Some(max_price) = args.max_price {
        filters.max_price = filter::validate_max_price(max_price)?;
    }
    if let Some(ref stops) = args.stops {
        filters.stops = filter::parse_stops(stops)?;
    }
    if let Some(ref carriers) = args.carriers {
        filters.carriers = carriers
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
    }
    filters.max_duration = args.max_duration;
    if let Some(ref window) = args.depart_window {
        filters.times.departure = filter::parse_time_window(window)?;
    }
    filters.bags.checked = args.checked_bags.unwrap_or(0);
    if args.no_self_transfer.unwrap_or(false) {
        filters.connections.self_transfer = false;
        filters.travel_hacks.self_transfer = false;
    }
    Ok(filters)
}

fn tool_error(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.into())]))
}

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
        Err(e) => tool_error(format!("failed to encode result: {e}")),
    }
}

#[derive(Clone)]
struct QuikwingMcp {
    client: ApiClient,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl QuikwingMcp {
    fn new(client: ApiClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Search for flights and return results as JSON. Results are deduplicated, filtered, sorted (best, cheapest or fastest) and tagged Cheapest, Fastest, Best, Direct or Bags Included. Each flight carries a booking_url that can be passed to open_url."
    )]
    async fn quikwing_search(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        let request = match to_request(&args, &self.client.config().currency) {
            Ok(r) => r,
            Err(e) => return tool_error(e.to_string()),
        };
        let filters = match to_filters(&args) {
            Ok(f) => f,
            Err(e) => return tool_error(e.to_string()),
        };
        let sort = match args.sort.as_deref().map(SortOption::from_str_loose).transpose() {
            Ok(s) => s.unwrap_or_default(),
            Err(e) => return tool_error(e.to_string()),
        };

        match crate::search(&self.client, &request, &filters, sort).await {
            Ok(mut result) => {
                if let Some(n) = args.top {
                    result.flights.truncate(n);
                }
                json_result(&result)
            }
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(
        description = "Look up airports by name, city or IATA code. Use it to resolve a city name to the 3-letter code quikwing_search expects."
    )]
    async fn quikwing_airports(
        &self,
        Parameters(args): Parameters<AirportsArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self.client.search_airports(&args.query).await {
            Ok(mut airports) => {
                airports.truncate(MAX_AIRPORTS);
                json_result(&airports)
            }
            Err(e) => tool_error(e.to_string()),
        }
    }

    #[tool(description = "Open a URL in the default web browser. Use it with a booking_url returned by quikwing_search.")]
    async fn open_url(
        &self,
        Parameters(args): Parameters<OpenUrlArgs>,
    ) -> Result<CallToolResult, McpError> {
        if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
            return tool_error("URL must start with http:// or https://");
        }

        match open::that(&args.url) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Opened: {}",
                args.url
            ))])),
            Err(e) => tool_error(format!("failed to open browser: {e}")),
        }
    }
}

#[tool_handler]
impl ServerHandler for QuikwingMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "quikwing".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Flight search tool. Workflow: (1) quikwing_airports to resolve city names to IATA codes if needed. (2) quikwing_search to find flights. (3) open_url with a flight's booking_url to book it.".into(),
            ),
        }
    }
}

/// Serves the tools over stdio until the client disconnects.
pub async fn run() {
    let client = match Config::from_env().and_then(ApiClient::new) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "MCP server configuration failed");
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let service = match QuikwingMcp::new(client).serve(rmcp::transport::stdio()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to start MCP server");
            std::process::exit(1);
        }
    };
    if let Err(e) = service.waiting().await {
        tracing::error!(error = %e, "MCP server error");
    }
}
