//! City code lookup, flight offer search and airport coordinates

use crate::client::{AmadeusClient, DataList};
use crate::{FlightOffer, GeoPoint, ScoutError};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const CITIES_PATH: &str = "/v1/reference-data/locations/cities";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";

// --- Amadeus JSON response types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CityLocation {
    iata_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFlightOffer {
    itineraries: Vec<Itinerary>,
    price: RawPrice,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    departure: Endpoint,
    arrival: Endpoint,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Endpoint {
    iata_code: String,
    at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrice {
    grand_total: String,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    geo_code: Option<GeoCode>,
}

#[derive(Debug, Deserialize)]
struct GeoCode {
    latitude: f64,
    longitude: f64,
}

/// Parameters of one destination search
#[derive(Debug, Clone)]
pub struct FlightQuery<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub max_price: f64,
    pub currency: &'a str,
    /// Dates from tomorrow up to, not including, `today + days`
    pub days: u32,
    pub today: NaiveDate,
    /// Pause after every request
    pub delay: Duration,
}

impl FlightQuery<'_> {
    /// Departure dates covered by the search
    pub fn departure_dates(&self) -> Vec<NaiveDate> {
        (1..u64::from(self.days))
            .map_while(|offset| self.today.checked_add_days(Days::new(offset)))
            .collect()
    }
}

impl AmadeusClient {
    /// Resolve a city name to its IATA city code
    #[instrument(level = "info", skip(self))]
    pub async fn city_code(&self, city: &str) -> Result<Option<String>, ScoutError> {
        let query = [("keyword", city), ("max", "1")];
        let response: DataList<CityLocation> = self.get_json(CITIES_PATH, &query).await?;
        let code = response.data.into_iter().next().and_then(|c| c.iata_code);

        match &code {
            Some(code) => info!(code = %code, "Resolved city code"),
            None => warn!("No city code found"),
        }
        Ok(code)
    }

    /// Cheapest offer for each departure date under the price ceiling.
    ///
    /// A failed date is logged and skipped.
    #[instrument(level = "info", skip(self, query), fields(destination = query.destination))]
    pub async fn search_flights(&self, query: &FlightQuery<'_>) -> Vec<FlightOffer> {
        let mut offers = Vec::new();
        let max_price = format!("{}", query.max_price.floor() as u64);

        for date in query.departure_dates() {
            let date_str = date.format("%Y-%m-%d").to_string();
            let params = [
                ("originLocationCode", query.origin),
                ("destinationLocationCode", query.destination),
                ("departureDate", date_str.as_str()),
                ("adults", "1"),
                ("maxPrice", max_price.as_str()),
                ("currencyCode", query.currency),
                ("max", "1"),
            ];

            match self.get_json::<_, DataList<RawFlightOffer>>(FLIGHT_OFFERS_PATH, &params).await {
                Ok(response) => match response.data.into_iter().next() {
                    Some(raw) => match to_flight_offer(raw, query.destination, query.currency) {
                        Ok(offer) => {
                            debug!(date = %date_str, price = %offer.price, "Flight offer found");
                            offers.push(offer);
                        }
                        Err(e) => warn!(date = %date_str, error = %e, "Unusable flight offer"),
                    },
                    None => debug!(date = %date_str, "No offer under price ceiling"),
                },
                Err(e) => warn!(date = %date_str, error = %e, "Flight search failed"),
            }

            tokio::time::sleep(query.delay).await;
        }

        info!(offers_found = offers.len(), "Flight search completed");
        offers
    }

    /// Coordinates of an airport or city
    #[instrument(level = "debug", skip(self))]
    pub async fn coordinates(&self, keyword: &str) -> Result<GeoPoint, ScoutError> {
        let query = [("subType", "AIRPORT,CITY"), ("keyword", keyword)];
        let response: DataList<Location> = self.get_json(LOCATIONS_PATH, &query).await?;

        response
            .data
            .into_iter()
            .find_map(|l| l.geo_code)
            .map(|g| GeoPoint {
                latitude: g.latitude,
                longitude: g.longitude,
            })
            .ok_or_else(|| ScoutError::MissingData(format!("no coordinates for {}", keyword)))
    }
}

fn to_flight_offer(raw: RawFlightOffer, city_code: &str, currency: &str) -> Result<FlightOffer, ScoutError> {
    let segments = raw
        .itineraries
        .into_iter()
        .next()
        .map(|i| i.segments)
        .unwrap_or_default();

    let (first, last) = match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ScoutError::MissingData("flight offer without segments".to_string())),
    };

    let departure = NaiveDateTime::parse_from_str(&first.departure.at, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| ScoutError::MissingData(format!("departure time {}: {}", first.departure.at, e)))?;

    Ok(FlightOffer {
        airport: last.arrival.iata_code.clone(),
        departure_date: departure.date(),
        departure_time: departure.format("%H:%M:%S").to_string(),
        price: raw.price.grand_total,
        currency: raw.price.currency.unwrap_or_else(|| currency.to_string()),
        city_code: city_code.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(days: u32) -> FlightQuery<'static> {
        FlightQuery {
            origin: "BEG",
            destination: "PAR",
            max_price: 120.0,
            currency: "EUR",
            days,
            today: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_departure_dates_start_tomorrow() {
        let dates = query(7).departure_dates();
        assert_eq!(dates.len(), 6);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 8, 2).unwrap());
        assert_eq!(dates[5], NaiveDate::from_ymd_opt(2025, 8, 7).unwrap());

        assert!(query(1).departure_dates().is_empty());
        assert!(query(0).departure_dates().is_empty());
    }

    #[test]
    fn test_parse_multi_segment_offer() {
        let raw: RawFlightOffer = serde_json::from_value(json!({
            "itineraries": [{
                "segments": [
                    {
                        "departure": {"iataCode": "BEG", "at": "2025-08-02T06:15:00"},
                        "arrival": {"iataCode": "VIE", "at": "2025-08-02T07:30:00"}
                    },
                    {
                        "departure": {"iataCode": "VIE", "at": "2025-08-02T09:00:00"},
                        "arrival": {"iataCode": "ORY", "at": "2025-08-02T11:05:00"}
                    }
                ]
            }],
            "price": {"currency": "EUR", "grandTotal": "98.40"}
        }))
        .unwrap();

        let offer = to_flight_offer(raw, "PAR", "USD").unwrap();
        assert_eq!(offer.airport, "ORY");
        assert_eq!(offer.departure_date, NaiveDate::from_ymd_opt(2025, 8, 2).unwrap());
        assert_eq!(offer.departure_time, "06:15:00");
        assert_eq!(offer.price, "98.40");
        assert_eq!(offer.currency, "EUR");
        assert_eq!(offer.city_code, "PAR");
    }

    #[test]
    fn test_offer_without_segments() {
        let raw: RawFlightOffer = serde_json::from_value(json!({
            "itineraries": [],
            "price": {"grandTotal": "10.00"}
        }))
        .unwrap();
        assert!(matches!(to_flight_offer(raw, "PAR", "EUR"), Err(ScoutError::MissingData(_))));
    }
}
