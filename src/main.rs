use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quikwing::config::Config;
use quikwing::currency::{RateCache, RATES_TTL};
use quikwing::error::FlightError;
use quikwing::fetch::ApiClient;
use quikwing::filter::{self, FilterState};
use quikwing::model::{Airport, SearchResult};
use quikwing::paginate::paginate;
use quikwing::query::{CabinClass, SearchRequest};
use quikwing::sort::SortOption;
use quikwing::table;

#[derive(Parser)]
#[command(
    name = "quikwing",
    about = "Search, filter and rank flight offers from the terminal",
    version,
    after_help = "\
Examples:
  quikwing search -f BER -t EWR -d 2026-04-01
  quikwing search -f BER -t EWR -d 2026-04-01 --return-date 2026-04-15 --sort cheapest
  quikwing search -f LHR -t JFK -d 2026-05-01 --stops direct --max-price 600
  quikwing airports berlin
  quikwing login -u alice -p secret

Configuration is read from QUIKWING_* environment variables (or a .env file)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(
        about = "Search for flights",
        long_about = "Search for one-way or round-trip flights, then filter, sort and page \
            through the results locally.",
        after_help = "\
Examples:
  One-way:      quikwing search -f BER -t EWR -d 2026-04-01
  Round-trip:   quikwing search -f BER -t EWR -d 2026-04-01 --return-date 2026-04-15
  Direct only:  quikwing search -f LHR -t JFK -d 2026-05-01 --stops direct
  Mornings:     quikwing search -f LHR -t JFK -d 2026-05-01 --depart-window 06:00-12:00
  With bags:    quikwing search -f LHR -t JFK -d 2026-05-01 --checked-bags 1
  JSON output:  quikwing search -f BER -t EWR -d 2026-04-01 --json --pretty"
    )]
    Search(Box<SearchArgs>),

    #[command(about = "Look up airports by name, city or IATA code")]
    Airports(AirportsArgs),

    #[command(about = "Sign in and print an access token")]
    Login(LoginArgs),

    #[command(about = "Start MCP server (stdio transport)")]
    Mcp,
}

#[derive(clap::Args)]
struct SearchArgs {
    #[arg(short, long, value_name = "IATA", help = "Departure airport code or location id (City:london_gb)")]
    from: String,

    #[arg(short, long, value_name = "IATA", help = "Arrival airport code or location id")]
    to: String,

    #[arg(short, long, value_name = "YYYY-MM-DD", help = "Departure date")]
    date: String,

    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        help = "Return date (makes the search round-trip)"
    )]
    return_date: Option<String>,

    #[arg(long, default_value = "1", value_name = "N", help = "Number of adult passengers")]
    adults: u32,

    #[arg(
        long,
        default_value = "economy",
        value_name = "CLASS",
        help = "Cabin class [economy, premium-economy, business, first]"
    )]
    cabin: String,

    #[arg(long, value_name = "CODE", help = "Currency code (e.g. USD, EUR, GBP)")]
    currency: Option<String>,

    #[arg(
        long,
        value_name = "CODE",
        help = "Convert displayed prices to this currency using live exchange rates"
    )]
    display_currency: Option<String>,

    #[arg(long, default_value = "20", value_name = "N", help = "Results requested from the API")]
    limit: u32,

    #[arg(long, value_name = "AMOUNT", help = "Maximum total price")]
    max_price: Option<f64>,

    #[arg(long, value_name = "STOPS", help = "Stops allowed [any, direct, 1, 2]")]
    stops: Option<String>,

    #[arg(long, help = "Refuse itineraries with an overnight stopover")]
    no_overnight: bool,

    #[arg(long, value_name = "AA,LH,...", help = "Only these carriers (codes or names)")]
    carriers: Option<String>,

    #[arg(long, value_name = "MIN", help = "Maximum duration per leg, in minutes")]
    max_duration: Option<u32>,

    #[arg(long, value_name = "HH:MM-HH:MM", help = "Outbound departure time window")]
    depart_window: Option<String>,

    #[arg(long, value_name = "HH:MM-HH:MM", help = "Outbound arrival time window")]
    arrive_window: Option<String>,

    #[arg(long, default_value = "0", value_name = "N", help = "Minimum included cabin bags")]
    cabin_bags: u32,

    #[arg(long, default_value = "0", value_name = "N", help = "Minimum included checked bags")]
    checked_bags: u32,

    #[arg(long, help = "Exclude self-transfer itineraries")]
    no_self_transfer: bool,

    #[arg(long, value_name = "MIN-MAX", help = "Allowed layover length, in minutes")]
    stopover: Option<String>,

    #[arg(long, value_name = "mon,tue,...", help = "Allowed outbound weekdays")]
    depart_days: Option<String>,

    #[arg(long, value_name = "mon,tue,...", help = "Allowed return weekdays")]
    return_days: Option<String>,

    #[arg(
        long,
        default_value = "best",
        value_name = "ORDER",
        help = "Sort order [best, cheapest, fastest]"
    )]
    sort: String,

    #[arg(long, default_value = "1", value_name = "N", help = "Page to show (1-indexed)")]
    page: usize,

    #[arg(long, value_name = "N", help = "Results per page [default: 15]")]
    page_size: Option<usize>,

    #[arg(long, help = "One-line-per-flight output (recommended for scripts and AI agents)")]
    compact: bool,

    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,

    #[arg(long, help = "Open the booking page of the first result")]
    open: bool,

    #[arg(long, value_name = "URL", help = "HTTP or SOCKS5 proxy")]
    proxy: Option<String>,

    #[arg(long, value_name = "SECS", help = "Request timeout [default: 30]")]
    timeout: Option<u64>,
}

#[derive(clap::Args)]
struct AirportsArgs {
    #[arg(value_name = "QUERY", help = "Part of an airport name, city or code")]
    query: String,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Args)]
struct LoginArgs {
    #[arg(short, long, value_name = "USER")]
    username: String,

    #[arg(short, long, value_name = "PASS")]
    password: String,
}

fn is_json(args: &SearchArgs) -> bool {
    args.json || args.pretty
}

fn die(err: &FlightError, json_mode: bool) -> ! {
    if json_mode {
        let json = serde_json::json!({
            "error": {
                "kind": err.kind(),
                "message": err.to_string(),
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {err}");
    }
    process::exit(err.exit_code());
}

fn load_config(proxy: Option<&String>, timeout: Option<u64>) -> Result<Config, FlightError> {
    let mut config = Config::from_env()?;
    if let Some(proxy) = proxy {
        config.fetch.proxy = Some(proxy.clone());
    }
    if let Some(timeout) = timeout {
        config.fetch.timeout = timeout;
    }
    Ok(config)
}

fn build_request(args: &SearchArgs, config: &Config) -> Result<SearchRequest, FlightError> {
    let mut request = SearchRequest::new(&args.from, &args.to, &args.date);
    request.return_date = args.return_date.clone();
    request.adults = args.adults;
    request.cabin = CabinClass::from_str_loose(&args.cabin)?;
    request.currency = args
        .currency
        .as_ref()
        .map_or_else(|| config.currency.clone(), |c| c.to_uppercase());
    request.limit = args.limit;
    Ok(request)
}

fn display_currency(args: &SearchArgs) -> Result<Option<String>, FlightError> {
    let Some(ref code) = args.display_currency else {
        return Ok(None);
    };
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(FlightError::Validation(format!(
            "invalid display currency \"{code}\", expected a 3-letter code such as EUR"
        )));
    }
    Ok(Some(code))
}

fn build_filters(args: &SearchArgs) -> Result<FilterState, FlightError> {
    let mut filters = FilterState::default();

    if let Some(max_price) = args.max_price {
        filters.max_price = filter::validate_max_price(max_price)?;
    }
    if let Some(ref stops) = args.stops {
        filters.stops = filter::parse_stops(stops)?;
    }
    filters.stops.allow_overnight = !args.no_overnight;
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
    if let Some(ref window) = args.arrive_window {
        filters.times.arrival = filter::parse_time_window(window)?;
    }
    filters.bags.cabin = args.cabin_bags;
    filters.bags.checked = args.checked_bags;
    if args.no_self_transfer {
        filters.connections.self_transfer = false;
        filters.travel_hacks.self_transfer = false;
    }
    if let Some(ref range) = args.stopover {
        filters.stopover_duration = filter::parse_minute_range(range)?;
    }
    if let Some(ref days) = args.depart_days {
        filters.days.departure = filter::parse_days(days)?;
    }
    if let Some(ref days) = args.return_days {
        filters.days.return_days = filter::parse_days(days)?;
    }

    Ok(filters)
}

fn print_result(result: &SearchResult, args: &SearchArgs, config: &Config) {
    let page_size = args.page_size.unwrap_or(config.page_size);
    let page = paginate(&result.flights, args.page, page_size);

    if is_json(args) {
        let output = if args.pretty {
            serde_json::to_string_pretty(&page)
        } else {
            serde_json::to_string(&page)
        };
        match output {
            Ok(json) => println!("{json}"),
            Err(e) => die(&FlightError::Decode(e.to_string()), true),
        }
        return;
    }

    if page.items.is_empty() {
        println!("{}", FlightError::NoResults);
        return;
    }

    if args.compact {
        for flight in &page.items {
            println!("{}", table::compact_line(flight, &config.currency_symbols));
        }
    } else {
        println!("{}", table::render(&page.items, &config.currency_symbols));
        println!(
            "Page {} of {} ({} flights)",
            page.page, page.total_pages, page.total_items
        );
    }
}

fn print_airports(airports: &[Airport], json: bool) {
    if json {
        match serde_json::to_string(airports) {
            Ok(out) => println!("{out}"),
            Err(e) => die(&FlightError::Decode(e.to_string()), true),
        }
        return;
    }
    if airports.is_empty() {
        println!("No matches.");
        return;
    }
    for a in airports {
        println!("{}  {} — {}, {}", a.iata, a.name, a.city, a.country);
    }
}

async fn run_search(args: &SearchArgs) {
    let json_mode = is_json(args);

    let config = load_config(args.proxy.as_ref(), args.timeout).unwrap_or_else(|e| die(&e, json_mode));
    let request = build_request(args, &config).unwrap_or_else(|e| die(&e, json_mode));
    let filters = build_filters(args).unwrap_or_else(|e| die(&e, json_mode));
    let sort = SortOption::from_str_loose(&args.sort).unwrap_or_else(|e| die(&e, json_mode));
    let display = display_currency(args).unwrap_or_else(|e| die(&e, json_mode));

    if let Err(e) = request.validate() {
        die(&e, json_mode);
    }

    let client = ApiClient::new(config.clone()).unwrap_or_else(|e| die(&e, json_mode));

    match quikwing::search(&client, &request, &filters, sort).await {
        Ok(mut result) => {
            if let Some(ref code) = display {
                if !code.eq_ignore_ascii_case(&result.currency) {
                    let mut rates = RateCache::new(config.fallback_rates.clone(), RATES_TTL);
                    rates.current(&client).await.convert_result(&mut result, code);
                }
            }
            if args.open {
                match result.flights.first().map(|f| f.booking_url.as_str()) {
                    Some(url) if !url.is_empty() => {
                        println!("Opening: {url}");
                        if let Err(e) = open::that(url) {
                            die(
                                &FlightError::Validation(format!("failed to open browser: {e}")),
                                json_mode,
                            );
                        }
                        return;
                    }
                    _ => die(
                        &FlightError::Validation("no booking link for the top result".into()),
                        json_mode,
                    ),
                }
            }
            print_result(&result, args, &config);
        }
        Err(e) => die(&e, json_mode),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mcp => quikwing::mcp::run().await,
        Commands::Search(args) => run_search(&args).await,
        Commands::Airports(args) => {
            let config = load_config(None, None).unwrap_or_else(|e| die(&e, args.json));
            let client = ApiClient::new(config).unwrap_or_else(|e| die(&e, args.json));
            let airports = match client.search_airports(&args.query).await {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(error = %e, "airport lookup failed");
                    Vec::new()
                }
            };
            print_airports(&airports, args.json);
        }
        Commands::Login(args) => {
            let config = load_config(None, None).unwrap_or_else(|e| die(&e, false));
            let client = ApiClient::new(config).unwrap_or_else(|e| die(&e, false));
            match client.login(&args.username, &args.password).await {
                Ok(token) => println!("{}", token.access_token),
                Err(e) => die(&e, false),
            }
        }
    }
}
