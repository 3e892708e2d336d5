//! Visual Crossing timeline client.
//!
//! Fetches one condition description per day for a coordinate and feeds it
//! to a [`ConditionScorer`].

use crate::weather_score::ConditionScorer;
use crate::{GeoPoint, ScoutError};
use chrono::{Days, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

const SERVICE: &str = "visualcrossing";

/// One forecast day; every other field of the response is ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastDay {
    #[serde(default)]
    pub datetime: Option<NaiveDate>,
    #[serde(default)]
    pub conditions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    days: Vec<ForecastDay>,
}

/// Last day of a window of `nights` starting at `start`
pub fn window_end(start: NaiveDate, nights: u32) -> Result<NaiveDate, ScoutError> {
    start
        .checked_add_days(Days::new(u64::from(nights)))
        .ok_or_else(|| ScoutError::MissingData(format!("{} nights from {} is out of range", nights, start)))
}

pub struct WeatherClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ScoutError> {
        Ok(Self {
            http_client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Daily forecast records between two dates, inclusive
    #[instrument(level = "debug", skip(self))]
    pub async fn daily_forecast(
        &self,
        point: GeoPoint,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ForecastDay>, ScoutError> {
        let url = format!(
            "{}/{}/{}/{}",
            self.base_url,
            point.as_path_segment(),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        let query = [
            ("key", self.api_key.as_str()),
            ("maxStations", "1"),
            ("unitGroup", "metric"),
            ("include", "days"),
            ("elements", "datetime,conditions"),
        ];

        let response = self.http_client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoutError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let timeline: TimelineResponse = response.json().await?;
        debug!(days = timeline.days.len(), "Forecast received");
        Ok(timeline.days)
    }

    /// Reset `scorer`, record the window's conditions and score them
    #[instrument(level = "info", skip(self, scorer))]
    pub async fn score_window(
        &self,
        scorer: &mut ConditionScorer,
        point: GeoPoint,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, ScoutError> {
        scorer.reset();
        let days = self.daily_forecast(point, start, end).await?;
        scorer.record_all(days.into_iter().map(|d| d.conditions.unwrap_or_default()));

        let score = scorer.score()?;
        info!(score, days = scorer.len(), "Weather window scored");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_window_end() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 28).unwrap();
        assert_eq!(window_end(start, 7).unwrap(), NaiveDate::from_ymd_opt(2026, 1, 4).unwrap());
        assert_eq!(window_end(start, 0).unwrap(), start);

        let result = window_end(NaiveDate::MAX, 1);
        assert!(matches!(result, Err(ScoutError::MissingData(_))));
        assert!(window_end(start, 4_000_000_000).is_err());
    }

    #[test]
    fn test_parse_timeline() {
        let timeline: TimelineResponse = serde_json::from_value(json!({
            "resolvedAddress": "48.8566,2.3522",
            "days": [
                {"datetime": "2025-08-02", "conditions": "Partially cloudy", "temp": 24.1},
                {"datetime": "2025-08-03", "conditions": null},
                {"datetime": "2025-08-04"}
            ]
        }))
        .unwrap();

        assert_eq!(timeline.days.len(), 3);
        assert_eq!(timeline.days[0].conditions.as_deref(), Some("Partially cloudy"));
        assert_eq!(timeline.days[1].conditions, None);
        assert_eq!(timeline.days[2].conditions, None);
        assert_eq!(timeline.days[2].datetime, NaiveDate::from_ymd_opt(2025, 8, 4));
    }
}
