use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlightError {
    #[error(
        "request timed out — the flight search API may be slow or unreachable. \
         Try increasing --timeout or check your connection"
    )]
    Timeout,

    #[error("connection failed — check your internet connection ({0})")]
    ConnectionFailed(String),

    #[error("DNS resolution failed for {0} — check your internet connection")]
    DnsResolution(String),

    #[error("proxy error — check your --proxy URL is correct ({0})")]
    ProxyError(String),

    #[error("TLS/SSL error — connection to the search API failed ({0})")]
    TlsError(String),

    #[error(
        "rate limited by the search API (HTTP 429) — wait a few minutes before retrying, \
         or use --proxy to route through a different IP"
    )]
    RateLimited,

    #[error("request blocked by the search API (HTTP {0}) — try again later or use --proxy")]
    Blocked(u16),

    #[error("unexpected HTTP status {0} from the search API")]
    HttpStatus(u16),

    #[error("failed to decode API response — {0}")]
    Decode(String),

    #[error("no flights found for this search")]
    NoResults,

    #[error("invalid airport code \"{0}\" — use a 3-letter IATA code (e.g. JFK, BER) or a location id (e.g. City:london_gb, Country:GB)")]
    InvalidAirport(String),

    #[error("invalid date \"{0}\" — must be YYYY-MM-DD format (e.g. 2026-03-01)")]
    InvalidDate(String),

    #[error("{0}")]
    Validation(String),

    #[error("sign-in failed — {0}")]
    AuthFailed(String),

    #[error("invalid configuration for {var}: {reason}")]
    Config { var: String, reason: String },
}

impl FlightError {
    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidAirport(_)
            | Self::InvalidDate(_)
            | Self::Validation(_)
            | Self::Config { .. } => 2,
            Self::Timeout
            | Self::ConnectionFailed(_)
            | Self::DnsResolution(_)
            | Self::TlsError(_)
            | Self::ProxyError(_) => 3,
            Self::RateLimited | Self::Blocked(_) => 4,
            Self::HttpStatus(_) | Self::AuthFailed(_) => 5,
            Self::Decode(_) => 6,
            Self::NoResults => 0,
        }
    }

    /// Stable machine-readable name, used in JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAirport(_) => "invalid_airport",
            Self::InvalidDate(_) => "invalid_date",
            Self::Validation(_) => "validation_error",
            Self::Config { .. } => "config_error",
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::DnsResolution(_) => "dns_error",
            Self::TlsError(_) => "tls_error",
            Self::ProxyError(_) => "proxy_error",
            Self::RateLimited => "rate_limited",
            Self::Blocked(_) => "blocked",
            Self::HttpStatus(_) => "http_error",
            Self::AuthFailed(_) => "auth_failed",
            Self::Decode(_) => "decode_error",
            Self::NoResults => "no_results",
        }
    }
}

pub fn from_http_error(err: wreq::Error) -> FlightError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if err.is_timeout() {
        return FlightError::Timeout;
    }

    if err.is_connect() {
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("getaddrinfo") {
            return FlightError::DnsResolution(msg);
        }
        return FlightError::ConnectionFailed(msg);
    }

    if lower.contains("proxy") || lower.contains("socks") {
        return FlightError::ProxyError(msg);
    }

    if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        return FlightError::TlsError(msg);
    }

    if lower.contains("builder error") && lower.contains("uri") {
        return FlightError::ProxyError(msg);
    }

    FlightError::ConnectionFailed(msg)
}
