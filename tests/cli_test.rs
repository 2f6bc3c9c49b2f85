use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("quikwing"));
    cmd.env("QUIKWING_API_URL", "http://127.0.0.1:9")
        .env_remove("QUIKWING_PAGE_SIZE")
        .env_remove("QUIKWING_TIMEOUT");
    cmd
}

fn search(extra: &[&str]) -> Command {
    let mut c = cmd();
    c.args(["search", "-f", "BER", "-t", "EWR", "-d", "2026-04-01"]);
    c.args(extra);
    c
}

fn json_error(extra: &[&str]) -> serde_json::Value {
    let mut args = extra.to_vec();
    args.push("--json");
    let output = search(&args).assert().failure().code(2);
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    serde_json::from_str(&stdout).expect("valid JSON error")
}

#[test]
fn top_level_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Search, filter and rank flight offers from the terminal",
        ))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("airports"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("Examples:"))
        .stdout(predicate::str::contains("quikwing search -f BER -t EWR"));
}

#[test]
fn top_level_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quikwing 0.3.0"));
}

#[test]
fn search_help_lists_filters() {
    cmd()
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-f, --from <IATA>"))
        .stdout(predicate::str::contains("-t, --to <IATA>"))
        .stdout(predicate::str::contains("-d, --date <YYYY-MM-DD>"))
        .stdout(predicate::str::contains("--return-date"))
        .stdout(predicate::str::contains("--cabin <CLASS>"))
        .stdout(predicate::str::contains("--max-price <AMOUNT>"))
        .stdout(predicate::str::contains("--stops <STOPS>"))
        .stdout(predicate::str::contains("--carriers <AA,LH,...>"))
        .stdout(predicate::str::contains("--depart-window <HH:MM-HH:MM>"))
        .stdout(predicate::str::contains("--stopover <MIN-MAX>"))
        .stdout(predicate::str::contains("--no-self-transfer"))
        .stdout(predicate::str::contains("--sort <ORDER>"))
        .stdout(predicate::str::contains("--page <N>"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--compact"))
        .stdout(predicate::str::contains("One-way:"))
        .stdout(predicate::str::contains("Round-trip:"))
        .stdout(predicate::str::contains("Direct only:"));
}

#[test]
fn search_help_shows_defaults() {
    cmd()
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: economy]"))
        .stdout(predicate::str::contains("[default: best]"))
        .stdout(predicate::str::contains("[default: 1]"))
        .stdout(predicate::str::contains("[default: 20]"));
}

#[test]
fn missing_route_args_fail() {
    cmd()
        .arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--from <IATA>"));
}

#[test]
fn invalid_airport_code() {
    cmd()
        .args(["search", "-f", "X1", "-t", "EWR", "-d", "2026-04-01"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid airport code"))
        .stderr(predicate::str::contains("3-letter IATA code"));
}

#[test]
fn same_origin_and_destination() {
    cmd()
        .args(["search", "-f", "BER", "-t", "ber", "-d", "2026-04-01"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("must differ"));
}

#[test]
fn invalid_date_format() {
    cmd()
        .args(["search", "-f", "BER", "-t", "EWR", "-d", "01-04-2026"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn return_before_departure() {
    search(&["--return-date", "2026-03-20"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("before departure"));
}

#[test]
fn invalid_cabin_class() {
    search(&["--cabin", "luxury"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid cabin class"));
}

#[test]
fn too_many_passengers() {
    search(&["--adults", "10"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("exceeds maximum of 9"));
}

#[test]
fn invalid_sort_option() {
    search(&["--sort", "random"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid sort option"));
}

#[test]
fn invalid_stops_value() {
    search(&["--stops", "5"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid stops value"));
}

#[test]
fn invalid_time_window() {
    search(&["--depart-window", "noon-evening"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("HH:MM-HH:MM"));
}

#[test]
fn invalid_weekday() {
    search(&["--depart-days", "mon,funday"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid weekday: funday"));
}

#[test]
fn json_mode_error_is_structured() {
    let output = cmd()
        .args(["search", "-f", "X1", "-t", "EWR", "-d", "2026-04-01", "--json"])
        .assert()
        .failure()
        .code(2);
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON error");
    assert_eq!(parsed["error"]["kind"], "invalid_airport");
    assert!(parsed["error"]["message"]
        .as_str()
        .unwrap()
        .contains("3-letter IATA code"));
}

#[test]
fn json_mode_validation_error() {
    let parsed = json_error(&["--adults", "0"]);
    assert_eq!(parsed["error"]["kind"], "validation_error");
    assert!(parsed["error"]["message"]
        .as_str()
        .unwrap()
        .contains("at least one passenger"));
}

#[test]
fn json_mode_invalid_date() {
    let parsed = json_error(&["--return-date", "2026-02-30"]);
    assert_eq!(parsed["error"]["kind"], "invalid_date");
}

#[test]
fn bad_config_is_reported() {
    search(&[])
        .env("QUIKWING_TIMEOUT", "soon")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("QUIKWING_TIMEOUT"));
}

#[test]
fn unreachable_api_is_a_network_error() {
    let output = search(&["--timeout", "3", "--json"])
        .assert()
        .failure()
        .code(3);
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON error");
    assert!(parsed["error"]["kind"].is_string());
}

#[test]
fn airports_with_empty_query_prints_nothing_found() {
    cmd()
        .args(["airports", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches."));
}

fn itinerary(id: &str, price: f64) -> Value {
    json!({
        "id": id,
        "price": {"amount": price},
        "sector": {
            "duration": 32400,
            "sectorSegments": [{
                "segment": {
                    "source": {"localTime": "2026-04-01T10:00:00", "station": {"code": "BER"}},
                    "destination": {"localTime": "2026-04-01T13:00:00", "station": {"code": "EWR"}},
                    "carrier": {"code": "UA", "name": "United Airlines"},
                    "code": format!("9{id}"),
                    "duration": 32400,
                }
            }],
        },
    })
}

async fn api_returning(itineraries: Vec<Value>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flights/search/one-way"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currency": "USD",
            "itineraries": itineraries,
        })))
        .mount(&server)
        .await;
    server
}

fn search_against(server: &MockServer, extra: &[&str]) -> Command {
    let mut c = search(extra);
    c.env("QUIKWING_API_URL", server.uri())
        .env("QUIKWING_RATES_URL", format!("{}/rates", server.uri()));
    c
}

fn stdout_json(c: &mut Command) -> Value {
    let output = c.assert().success().code(0);
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    serde_json::from_str(&stdout).expect("valid JSON page")
}

#[tokio::test(flavor = "multi_thread")]
async fn json_search_prints_the_requested_page() {
    let server = api_returning(vec![
        itinerary("a", 500.0),
        itinerary("b", 100.0),
        itinerary("c", 400.0),
        itinerary("d", 200.0),
        itinerary("e", 300.0),
    ])
    .await;

    let page = stdout_json(&mut search_against(
        &server,
        &["--json", "--sort", "cheapest", "--page", "2", "--page-size", "2"],
    ));
    assert_eq!(page["page"], 2);
    assert_eq!(page["page_size"], 2);
    assert_eq!(page["total_items"], 5);
    assert_eq!(page["total_pages"], 3);
    let ids: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["e", "c"]);
    assert_eq!(page["items"][0]["currency"], "USD");
}

#[tokio::test(flavor = "multi_thread")]
async fn one_way_search_sends_departure_dates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flights/search/one-way"))
        .and(query_param("departure_date_start", "2026-04-01"))
        .and(query_param("departure_date_end", "2026-04-01"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"itineraries": [itinerary("a", 99.0)]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = stdout_json(&mut search_against(&server, &["--json"]));
    assert_eq!(page["total_items"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn compact_output_is_one_line_per_flight() {
    let server = api_returning(vec![itinerary("a", 300.0), itinerary("b", 250.0)]).await;

    let output = search_against(&server, &["--compact", "--sort", "cheapest"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{stdout}");
    assert!(lines[0].starts_with("$250 | BER>EWR 2026-04-01 10:00>13:00 9h 00m | nonstop | United Airlines"));
    assert!(lines[1].starts_with("$300 | "));
    assert!(!stdout.contains("Page "));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_result_exits_zero() {
    let server = api_returning(Vec::new()).await;

    search_against(&server, &[])
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::contains("no flights found"));

    let page = stdout_json(&mut search_against(&server, &["--json"]));
    assert_eq!(page["items"], json!([]));
    assert_eq!(page["total_items"], 0);
    assert_eq!(page["total_pages"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn display_currency_uses_live_rates() {
    let server = api_returning(vec![itinerary("a", 300.0)]).await;
    Mock::given(method("GET"))
        .and(path("/rates"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"base": "USD", "rates": {"EUR": 0.5}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = stdout_json(&mut search_against(&server, &["--json", "--display-currency", "eur"]));
    assert_eq!(page["items"][0]["currency"], "EUR");
    assert_eq!(page["items"][0]["price"], 150.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn display_currency_falls_back_when_rates_are_down() {
    let server = api_returning(vec![itinerary("a", 300.0)]).await;
    Mock::given(method("GET"))
        .and(path("/rates"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let page = stdout_json(&mut search_against(&server, &["--json", "--display-currency", "EUR"]));
    assert_eq!(page["items"][0]["currency"], "EUR");
    let price = page["items"][0]["price"].as_f64().unwrap();
    assert!((price - 276.0).abs() < 1e-6, "price {price}");
}

#[test]
fn invalid_display_currency() {
    search(&["--display-currency", "euro"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid display currency"));
}
