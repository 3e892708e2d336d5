//! Runtime configuration, read from environment variables

use crate::ScoutError;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_AMADEUS_BASE_URL: &str = "https://test.api.amadeus.com";
pub const DEFAULT_WEATHER_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";
pub const DEFAULT_TWILIO_BASE_URL: &str = "https://api.twilio.com";
pub const DEFAULT_TWILIO_FROM: &str = "whatsapp:+14155238886"; // Twilio sandbox number

/// Longest search window or stay, in days
pub const MAX_DAYS: u32 = 365;

/// Client id/secret pair for one Amadeus application
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub amadeus_base_url: String,
    pub flight_credentials: Credentials,
    pub hotel_credentials: Credentials,

    pub sheety_endpoint: String,
    pub sheety_token: String,

    pub weather_base_url: String,
    pub weather_api_key: String,

    pub twilio_base_url: String,
    pub twilio_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from: String,
    pub phone: String,

    /// IATA code every flight departs from
    pub origin: String,
    /// Departure dates searched, counted from today
    pub search_days: u32,
    /// Length of the weather window and hotel stay
    pub stay_nights: u32,
    /// Minimum weather score before hotels are searched
    pub weather_threshold: f64,
    /// Pause after every flight search request
    pub request_delay: Duration,
    pub max_hotels: usize,
    pub hotel_radius_km: u32,
    pub hotel_ratings: String,
    pub currency: String,
}

impl ScoutConfig {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ScoutError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from a fixed set of variables
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ScoutError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ScoutError::Config(format!("{} must be set", key)))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            amadeus_base_url: trim_slash(or_default("AMADEUS_BASE_URL", DEFAULT_AMADEUS_BASE_URL)),
            flight_credentials: Credentials {
                client_id: required("FLIGHT_DATA_KEY")?,
                client_secret: required("FLIGHT_DATA_SECRET")?,
            },
            hotel_credentials: Credentials {
                client_id: required("HOTEL_KEY")?,
                client_secret: required("HOTEL_SECRET")?,
            },
            sheety_endpoint: trim_slash(required("SHEETY_ENDPOINT")?),
            sheety_token: required("SHEETY_AUTH_TOKEN")?,
            weather_base_url: trim_slash(or_default("WEATHER_BASE_URL", DEFAULT_WEATHER_BASE_URL)),
            weather_api_key: required("WEATHER_API")?,
            twilio_base_url: trim_slash(or_default("TWILIO_BASE_URL", DEFAULT_TWILIO_BASE_URL)),
            twilio_sid: required("TWILIO_SID")?,
            twilio_auth_token: required("TWILIO_AUTH")?,
            twilio_from: or_default("TWILIO_FROM", DEFAULT_TWILIO_FROM),
            phone: required("PHONE")?,
            origin: or_default("ORIGIN_IATA", "BEG").to_uppercase(),
            search_days: parse_or(&lookup, "SEARCH_DAYS", 7)?,
            stay_nights: parse_or(&lookup, "STAY_NIGHTS", 7)?,
            weather_threshold: parse_or(&lookup, "WEATHER_THRESHOLD", 3.5)?,
            request_delay: Duration::from_millis(parse_or(&lookup, "REQUEST_DELAY_MS", 200)?),
            max_hotels: parse_or(&lookup, "MAX_HOTELS", 10)?,
            hotel_radius_km: parse_or(&lookup, "HOTEL_RADIUS_KM", 2)?,
            hotel_ratings: or_default("HOTEL_RATINGS", "3"),
            currency: or_default("CURRENCY", "EUR"),
        };

        for (key, value) in [("SEARCH_DAYS", config.search_days), ("STAY_NIGHTS", config.stay_nights)] {
            if !(1..=MAX_DAYS).contains(&value) {
                return Err(ScoutError::Config(format!(
                    "{} must be between 1 and {}, got {}",
                    key, MAX_DAYS, value
                )));
            }
        }

        if !(0.0..=5.0).contains(&config.weather_threshold) {
            return Err(ScoutError::Config(format!(
                "WEATHER_THRESHOLD must be between 0 and 5, got {}",
                config.weather_threshold
            )));
        }

        Ok(config)
    }
}

/// Weather API base URL and key, for commands that only need the forecast
pub fn weather_settings_from_env() -> Result<(String, String), ScoutError> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }
    let api_key = std::env::var("WEATHER_API")
        .map_err(|_| ScoutError::Config("WEATHER_API must be set".to_string()))?;
    let base_url = std::env::var("WEATHER_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_WEATHER_BASE_URL.to_string());
    Ok((trim_slash(base_url), api_key))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ScoutError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ScoutError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
