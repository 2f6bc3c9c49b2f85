//! One live result set plus the user's filter, sort and page state.
//!
//! Responses are tagged with a [`Ticket`] from a [`RequestGeneration`]
//! counter; a response whose ticket has been superseded by a newer search
//! is dropped instead of overwriting fresher results.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AUTOCOMPLETE_DEBOUNCE, SEARCH_DEBOUNCE};
use crate::fetch::ApiClient;
use crate::filter::FilterState;
use crate::model::{Airport, Flight};
use crate::normalize::NormalizeOptions;
use crate::paginate::{paginate, Page};
use crate::pipeline;
use crate::query::SearchRequest;
use crate::sort::SortOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Monotonic request counter. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration(Arc<AtomicU64>);

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0.load(Ordering::SeqCst) == ticket.0
    }
}

/// Trailing-edge debounce: `settle` resolves to a ticket only if no newer
/// call arrived during the window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    generation: RequestGeneration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: RequestGeneration::new(),
        }
    }

    /// Window for filter changes that trigger a refetch.
    pub fn for_search() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }

    pub fn for_autocomplete() -> Self {
        Self::new(AUTOCOMPLETE_DEBOUNCE)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn settle(&self) -> Option<Ticket> {
        let ticket = self.generation.begin();
        tokio::time::sleep(self.window).await;
        self.generation.is_current(ticket).then_some(ticket)
    }
}

#[derive(Debug)]
pub struct SearchSession {
    generation: RequestGeneration,
    flights: Vec<Flight>,
    filters: FilterState,
    sort: SortOption,
    page: usize,
    page_size: usize,
}

impl SearchSession {
    pub fn new(page_size: usize) -> Self {
        Self {
            generation: RequestGeneration::new(),
            flights: Vec::new(),
            filters: FilterState::default(),
            sort: SortOption::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn generation(&self) -> &RequestGeneration {
        &self.generation
    }

    pub fn begin_request(&self) -> Ticket {
        self.generation.begin()
    }

    /// Replaces the result set if `ticket` is still the newest request.
    /// Returns whether the flights were taken.
    pub fn accept(&mut self, ticket: Ticket, flights: Vec<Flight>) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale search response");
            return false;
        }
        self.flights = flights;
        self.page = 1;
        true
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Every flight passing the filters, ordered and tagged.
    pub fn arranged(&self) -> Vec<Flight> {
        pipeline::arrange(&self.flights, &self.filters, self.sort)
    }

    pub fn view(&self) -> Page<Flight> {
        paginate(&self.arranged(), self.page, self.page_size)
    }

    /// Runs a search with the session's filters and stores the outcome
    /// unless a newer request started meanwhile.
    pub async fn refresh(
        &mut self,
        client: &ApiClient,
        request: &SearchRequest,
        opts: &NormalizeOptions,
    ) -> bool {
        let ticket = self.begin_request();
        let flights = fetch_flights(client, request, &self.filters, opts).await;
        self.accept(ticket, flights)
    }
}

/// Search plus dedup/normalize. Failures are logged and resolve to an
/// empty list.
pub async fn fetch_flights(
    client: &ApiClient,
    request: &SearchRequest,
    filters: &FilterState,
    opts: &NormalizeOptions,
) -> Vec<Flight> {
    match client.search(request, filters).await {
        Ok(response) => {
            let mut opts = opts.clone();
            if let Some(currency) = response.currency {
                opts.currency = currency;
            }
            pipeline::ingest(response.itineraries, request.is_round_trip(), &opts)
        }
        Err(e) => {
            tracing::warn!(error = %e, "flight search failed");
            Vec::new()
        }
    }
}

/// Debounced airport lookup; superseded or failed lookups yield `None` and
/// an empty list respectively.
pub async fn autocomplete(
    client: &ApiClient,
    debouncer: &Debouncer,
    query: &str,
) -> Option<Vec<Airport>> {
    debouncer.settle().await?;
    match client.search_airports(query).await {
        Ok(airports) => Some(airports),
        Err(e) => {
            tracing::warn!(error = %e, query, "airport lookup failed");
            Some(Vec::new())
        }
    }
}
