pub mod config;
pub mod currency;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod mcp;
pub mod model;
pub mod normalize;
pub mod paginate;
pub mod pipeline;
pub mod query;
pub mod raw;
pub mod session;
pub mod sort;
pub mod table;
pub mod timefmt;

use error::FlightError;
use fetch::ApiClient;
use filter::FilterState;
use model::SearchResult;
use query::SearchRequest;
use sort::SortOption;

/// Validates, fetches and runs the whole result pipeline. The response's
/// own currency, if any, wins over the configured one.
pub async fn search(
    client: &ApiClient,
    request: &SearchRequest,
    filters: &FilterState,
    sort: SortOption,
) -> Result<SearchResult, FlightError> {
    request.validate()?;
    let response = client.search(request, filters).await?;

    let currency = response
        .currency
        .clone()
        .unwrap_or_else(|| request.currency.clone());
    let opts = client.config().normalize_options(&currency);

    let flights = pipeline::run(
        response.itineraries,
        request.is_round_trip(),
        filters,
        sort,
        &opts,
    );

    Ok(SearchResult { currency, flights })
}
