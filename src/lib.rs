//! # Trip Scout
//!
//! Reads candidate destinations and price ceilings from a spreadsheet, looks
//! for cheap flights with the Amadeus API, scores the weather forecast of each
//! destination, and for sunny ones pairs the flight with a hotel offer and
//! sends a WhatsApp notification.
//!
//! The weather scoring lives in [`weather_score`] and is usable on its own:
//!
//! ```rust
//! use trip_scout::ConditionScorer;
//!
//! let mut scorer = ConditionScorer::new();
//! scorer.record("Clear");
//! scorer.record("Partially cloudy, rain");
//! assert_eq!(scorer.score().unwrap(), 3.5);
//! ```

pub mod client;
pub mod config;
pub mod flights;
pub mod hotels;
pub mod notify;
pub mod scout;
pub mod sheet;
pub mod weather;
pub mod weather_score;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types for convenience
pub use client::AmadeusClient;
pub use config::ScoutConfig;
pub use notify::WhatsAppNotifier;
pub use scout::{Scout, ScoutReport};
pub use sheet::{SheetClient, SheetRow};
pub use weather::{window_end, WeatherClient};
pub use weather_score::{score_condition, ConditionScorer, InsufficientDataError, ScorerState};

/// Error types for the trip scout
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication with {service} failed: {message}")]
    Auth { service: &'static str, message: String },

    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Missing data in response: {0}")]
    MissingData(String),

    #[error(transparent)]
    InsufficientData(#[from] InsufficientDataError),
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Location segment in the `lat,lon` form used by the weather API
    pub fn as_path_segment(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Cheapest flight found for one departure date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub airport: String,      // Arrival airport of the last segment
    pub departure_date: NaiveDate,
    pub departure_time: String,
    pub price: String,        // Grand total as reported by Amadeus
    pub currency: String,
    pub city_code: String,    // Destination city code used for the search
}

/// Hotel listed for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub hotel_id: String,
    pub name: String,
}

/// First priced offer of a hotel for a stay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOffer {
    pub total: String,
    pub currency: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// A flight and a hotel at a destination with good weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub city_code: String,
    pub airport: String,
    pub flight_price: String,
    pub flight_currency: String,
    pub hotel_name: String,
    pub hotel_id: String,
    pub hotel_price: String,
    pub currency: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub weather_score: f64,
}

/// Run the whole pipeline once with configuration from the environment
pub async fn scout_from_env() -> Result<ScoutReport, ScoutError> {
    let config = ScoutConfig::from_env()?;
    let scout = Scout::new(config)?;
    scout.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_path_segment() {
        let point = GeoPoint {
            latitude: 48.8566,
            longitude: 2.3522,
        };
        assert_eq!(point.as_path_segment(), "48.8566,2.3522");
    }

    #[test]
    fn test_error_display() {
        let err = ScoutError::Api {
            service: "amadeus",
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "amadeus returned 404: not found");

        let err = ScoutError::from(InsufficientDataError);
        assert!(matches!(err, ScoutError::InsufficientData(_)));
    }
}
