//! The scouting pipeline: sheet -> flights -> weather -> hotels -> message

use crate::client::AmadeusClient;
use crate::config::ScoutConfig;
use crate::flights::FlightQuery;
use crate::hotels::HotelSearch;
use crate::notify::{format_deal_message, WhatsAppNotifier};
use crate::sheet::{SheetClient, SheetRow};
use crate::weather::{window_end, WeatherClient};
use crate::weather_score::ConditionScorer;
use crate::{Deal, FlightOffer, ScoutError};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// A sheet row with its resolved city code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub row_id: u64,
    pub city: String,
    pub iata_code: String,
    pub max_price: f64,
}

/// Outcome of one scored flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightVerdict {
    pub flight: FlightOffer,
    pub weather_score: Option<f64>,
    pub good_weather: bool,
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutReport {
    pub destinations: Vec<Destination>,
    pub unresolved_cities: Vec<String>,
    pub flights: Vec<FlightVerdict>,
    pub deals: Vec<Deal>,
    pub notifications_sent: usize,
}

/// Whether a destination's weather is worth a hotel search
pub fn weather_is_good(score: f64, threshold: f64) -> bool {
    score >= threshold
}

pub struct Scout {
    config: ScoutConfig,
    flights: AmadeusClient,
    hotels: AmadeusClient,
    sheet: SheetClient,
    weather: WeatherClient,
    notifier: WhatsAppNotifier,
    update_sheet: bool,
    dry_run: bool,
}

impl Scout {
    pub fn new(config: ScoutConfig) -> Result<Self, ScoutError> {
        let flights = AmadeusClient::new(&config.amadeus_base_url, config.flight_credentials.clone())?;
        let hotels = AmadeusClient::new(&config.amadeus_base_url, config.hotel_credentials.clone())?;
        let sheet = SheetClient::new(&config.sheety_endpoint, &config.sheety_token)?;
        let weather = WeatherClient::new(&config.weather_base_url, &config.weather_api_key)?;
        let notifier = WhatsAppNotifier::new(
            &config.twilio_base_url,
            &config.twilio_sid,
            &config.twilio_auth_token,
            &config.twilio_from,
            &config.phone,
        )?;

        Ok(Self {
            config,
            flights,
            hotels,
            sheet,
            weather,
            notifier,
            update_sheet: false,
            dry_run: false,
        })
    }

    /// Write resolved IATA codes back to the sheet
    pub fn with_sheet_updates(mut self, update_sheet: bool) -> Self {
        self.update_sheet = update_sheet;
        self
    }

    /// Find deals without sending messages
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run with today's local date
    pub async fn run(&self) -> Result<ScoutReport, ScoutError> {
        self.run_from(Local::now().date_naive()).await
    }

    /// Run with departures counted from `today`
    #[instrument(level = "info", skip(self))]
    pub async fn run_from(&self, today: NaiveDate) -> Result<ScoutReport, ScoutError> {
        // Fail early on bad credentials
        self.flights.access_token().await?;
        self.hotels.access_token().await?;

        let (destinations, unresolved) = self.resolve_destinations().await?;
        let mut report = ScoutReport {
            unresolved_cities: unresolved,
            ..ScoutReport::default()
        };

        let mut scorer = ConditionScorer::new();
        for destination in &destinations {
            let query = FlightQuery {
                origin: &self.config.origin,
                destination: &destination.iata_code,
                max_price: destination.max_price,
                currency: &self.config.currency,
                days: self.config.search_days,
                today,
                delay: self.config.request_delay,
            };
            let offers = self.flights.search_flights(&query).await;
            if offers.is_empty() {
                info!(city_code = %destination.iata_code, "There are no flights");
                continue;
            }

            for flight in offers {
                let verdict = self.evaluate_flight(&mut scorer, flight, &mut report).await;
                report.flights.push(verdict);
            }
        }
        report.destinations = destinations;

        info!(
            destinations = report.destinations.len(),
            flights = report.flights.len(),
            deals = report.deals.len(),
            notifications_sent = report.notifications_sent,
            "Scouting run completed"
        );
        Ok(report)
    }

    /// Load the sheet and resolve every city to an IATA code.
    ///
    /// Returns the resolved destinations and the names that did not resolve.
    #[instrument(level = "info", skip(self))]
    pub async fn resolve_destinations(&self) -> Result<(Vec<Destination>, Vec<String>), ScoutError> {
        let rows = self.sheet.rows().await?;
        let mut destinations = Vec::new();
        let mut unresolved = Vec::new();

        for row in rows {
            match self.resolve_row(&row).await {
                Some(code) => destinations.push(Destination {
                    row_id: row.id,
                    city: row.city,
                    iata_code: code,
                    max_price: row.price,
                }),
                None => unresolved.push(row.city),
            }
        }

        Ok((destinations, unresolved))
    }

    async fn resolve_row(&self, row: &SheetRow) -> Option<String> {
        let city = row.city.trim().to_uppercase();
        let code = match self.flights.city_code(&city).await {
            Ok(Some(code)) => code,
            Ok(None) => return None,
            Err(e) => {
                warn!(city = %city, error = %e, "City code lookup failed");
                return None;
            }
        };

        let stored = row.iata_code.as_deref().filter(|c| !c.is_empty());
        if self.update_sheet && stored != Some(code.as_str()) {
            if let Err(e) = self.sheet.set_iata_code(row.id, &code).await {
                warn!(row_id = row.id, error = %e, "Could not update sheet row");
            }
        }
        Some(code)
    }

    async fn evaluate_flight(
        &self,
        scorer: &mut ConditionScorer,
        flight: FlightOffer,
        report: &mut ScoutReport,
    ) -> FlightVerdict {
        let start = flight.departure_date;
        let (score, end) = match self.weather_score(scorer, &flight, start).await {
            Ok(scored) => scored,
            Err(e) => {
                warn!(airport = %flight.airport, error = %e, "Weather scoring failed");
                return FlightVerdict {
                    flight,
                    weather_score: None,
                    good_weather: false,
                };
            }
        };
        info!(city_code = %flight.city_code, score, "Flight weather score");

        let good_weather = weather_is_good(score, self.config.weather_threshold);
        if !good_weather {
            info!(city_code = %flight.city_code, "Bad weather, skipping destination");
        } else {
            match self.find_deal(&flight, score, start, end).await {
                Ok(Some(deal)) => {
                    if self.notify(&deal).await {
                        report.notifications_sent += 1;
                    }
                    report.deals.push(deal);
                }
                Ok(None) => info!(city_code = %flight.city_code, "No available offers from hotels"),
                Err(e) => warn!(city_code = %flight.city_code, error = %e, "Hotel search failed"),
            }
        }

        FlightVerdict {
            flight,
            weather_score: Some(score),
            good_weather,
        }
    }

    /// Score of the stay window, with the window's last day
    async fn weather_score(
        &self,
        scorer: &mut ConditionScorer,
        flight: &FlightOffer,
        start: NaiveDate,
    ) -> Result<(f64, NaiveDate), ScoutError> {
        let end = window_end(start, self.config.stay_nights)?;
        let point = self.flights.coordinates(&flight.airport).await?;
        let score = self.weather.score_window(scorer, point, start, end).await?;
        Ok((score, end))
    }

    /// First hotel in the city with an offer for the stay
    async fn find_deal(
        &self,
        flight: &FlightOffer,
        score: f64,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Option<Deal>, ScoutError> {
        let search = HotelSearch {
            city_code: &flight.city_code,
            radius_km: self.config.hotel_radius_km,
            ratings: &self.config.hotel_ratings,
            limit: self.config.max_hotels,
        };

        for hotel in self.hotels.hotels_in_city(&search).await? {
            let offer = match self
                .hotels
                .hotel_offer(&hotel.hotel_id, check_in, check_out, &self.config.currency)
                .await
            {
                Ok(offer) => offer,
                Err(e) => {
                    warn!(hotel_id = %hotel.hotel_id, error = %e, "Hotel offer lookup failed");
                    continue;
                }
            };

            if let Some(offer) = offer {
                info!(hotel = %hotel.name, hotel_id = %hotel.hotel_id, "Found hotel offer");
                return Ok(Some(Deal {
                    city_code: flight.city_code.clone(),
                    airport: flight.airport.clone(),
                    flight_price: flight.price.clone(),
                    flight_currency: flight.currency.clone(),
                    hotel_name: hotel.name,
                    hotel_id: hotel.hotel_id,
                    hotel_price: offer.total,
                    currency: offer.currency,
                    check_in: offer.check_in,
                    check_out: offer.check_out,
                    weather_score: score,
                }));
            }
        }

        Ok(None)
    }

    /// Send the deal message; returns whether one went out
    async fn notify(&self, deal: &Deal) -> bool {
        let message = format_deal_message(deal);
        if self.dry_run {
            info!(city_code = %deal.city_code, "Dry run, message not sent");
            return false;
        }

        match self.notifier.send(&message).await {
            Ok(_) => true,
            Err(e) => {
                error!(city_code = %deal.city_code, error = %e, "Error sending WhatsApp message");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_gate() {
        assert!(weather_is_good(3.5, 3.5));
        assert!(weather_is_good(5.0, 3.5));
        assert!(!weather_is_good(3.49, 3.5));
        assert!(!weather_is_good(0.0, 3.5));
    }
}
