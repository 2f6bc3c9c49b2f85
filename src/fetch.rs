use std::time::Duration;

use wreq::Client;

use crate::config::{Config, AIRPORTS_PATH, LOGIN_PATH};
use crate::currency::ExchangeRates;
use crate::error::{self, FlightError};
use crate::filter::FilterState;
use crate::model::{Airport, AuthToken};
use crate::query::SearchRequest;
use crate::raw::{self, RawResponse};

/// Thin client over the upstream search, autocomplete and login endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Config,
}

fn check_status(status: u16) -> Result<(), FlightError> {
    match status {
        200..=299 => Ok(()),
        429 => Err(FlightError::RateLimited),
        403 | 503 => Err(FlightError::Blocked(status)),
        _ => Err(FlightError::HttpStatus(status)),
    }
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, FlightError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.fetch.timeout));

        if let Some(ref proxy) = config.fetch.proxy {
            builder = builder.proxy(wreq::Proxy::all(proxy).map_err(error::from_http_error)?);
        }

        let http = builder.build().map_err(error::from_http_error)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn get_text(&self, url: &str, params: &[(String, String)]) -> Result<String, FlightError> {
        let mut request = self.http.get(url).query(params);
        if let Some(ref token) = self.config.fetch.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(error::from_http_error)?;
        check_status(response.status().as_u16())?;
        response.text().await.map_err(error::from_http_error)
    }

    /// One search round trip. The endpoint is chosen by whether the request
    /// has a return date.
    pub async fn search(
        &self,
        request: &SearchRequest,
        filters: &FilterState,
    ) -> Result<RawResponse, FlightError> {
        let url = self.config.endpoint(request.trip().path());
        let params = request.to_url_params(filters);
        tracing::debug!(%url, source = %request.source, destination = %request.destination, "searching flights");

        let body = self.get_text(&url, &params).await?;
        let response = raw::decode_response(&body)?;
        tracing::info!(itineraries = response.itineraries.len(), "search response received");
        Ok(response)
    }

    pub async fn search_airports(&self, query: &str) -> Result<Vec<Airport>, FlightError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.config.endpoint(AIRPORTS_PATH);
        let params = vec![("q".to_string(), query.to_string())];
        let body = self.get_text(&url, &params).await?;
        serde_json::from_str(&body).map_err(|e| FlightError::Decode(e.to_string()))
    }

    /// Latest exchange rates from the configured third-party table. The
    /// bearer token is never sent there.
    pub async fn fetch_rates(&self) -> Result<ExchangeRates, FlightError> {
        let response = self
            .http
            .get(self.config.rates_url.as_str())
            .send()
            .await
            .map_err(error::from_http_error)?;
        check_status(response.status().as_u16())?;
        let body = response.text().await.map_err(error::from_http_error)?;
        let rates: ExchangeRates =
            serde_json::from_str(&body).map_err(|e| FlightError::Decode(e.to_string()))?;
        if rates.rates.is_empty() {
            return Err(FlightError::Decode("exchange rate table is empty".into()));
        }
        Ok(rates)
    }

    /// Form-encoded sign-in. Rejected credentials map to
    /// [`FlightError::AuthFailed`] carrying the server's `detail`, if any.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthToken, FlightError> {
        let url = self.config.endpoint(LOGIN_PATH);
        let form = [("username", username), ("password", password)];

        let response = self
            .http
            .post(url.as_str())
            .form(&form)
            .send()
            .await
            .map_err(error::from_http_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(error::from_http_error)?;
        match status {
            200..=299 => {}
            401 | 403 | 400 | 422 => {
                let detail = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
                    .unwrap_or_else(|| "incorrect username or password".to_string());
                return Err(FlightError::AuthFailed(detail));
            }
            _ => check_status(status)?,
        }

        let token: AuthToken =
            serde_json::from_str(&body).map_err(|e| FlightError::Decode(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(FlightError::AuthFailed("server returned an empty token".into()));
        }
        Ok(token)
    }
}
