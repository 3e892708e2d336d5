//! Hotel listing and hotel offer lookup

use crate::client::{AmadeusClient, DataList};
use crate::{Hotel, HotelOffer, ScoutError};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, instrument};

const HOTELS_BY_CITY_PATH: &str = "/v1/reference-data/locations/hotels/by-city";
const HOTEL_OFFERS_PATH: &str = "/v3/shopping/hotel-offers";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHotel {
    hotel_id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHotelOffers {
    #[serde(default)]
    offers: Vec<RawOffer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOffer {
    check_in_date: Option<NaiveDate>,
    check_out_date: Option<NaiveDate>,
    #[serde(default)]
    price: RawOfferPrice,
}

#[derive(Debug, Default, Deserialize)]
struct RawOfferPrice {
    total: Option<String>,
    currency: Option<String>,
}

/// Filters for the hotel listing
#[derive(Debug, Clone)]
pub struct HotelSearch<'a> {
    pub city_code: &'a str,
    pub radius_km: u32,
    pub ratings: &'a str,
    pub limit: usize,
}

impl AmadeusClient {
    /// Hotels in a city, at most `search.limit` of them
    #[instrument(level = "info", skip(self, search), fields(city_code = search.city_code))]
    pub async fn hotels_in_city(&self, search: &HotelSearch<'_>) -> Result<Vec<Hotel>, ScoutError> {
        let radius = search.radius_km.to_string();
        let query = [
            ("cityCode", search.city_code),
            ("radius", radius.as_str()),
            ("ratings", search.ratings),
        ];
        let response: DataList<RawHotel> = self.get_json(HOTELS_BY_CITY_PATH, &query).await?;

        let hotels: Vec<Hotel> = response
            .data
            .into_iter()
            .take(search.limit)
            .map(|h| Hotel {
                name: h.name.unwrap_or_else(|| "Unknown hotel name".to_string()),
                hotel_id: h.hotel_id,
            })
            .collect();

        info!(hotels_found = hotels.len(), "Hotel listing completed");
        Ok(hotels)
    }

    /// First offer of a hotel for the stay.
    ///
    /// Amadeus answers with an error status when a hotel has nothing to sell
    /// for the dates; that case is `Ok(None)`.
    #[instrument(level = "debug", skip(self))]
    pub async fn hotel_offer(
        &self,
        hotel_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        currency: &str,
    ) -> Result<Option<HotelOffer>, ScoutError> {
        let check_in_str = check_in.format("%Y-%m-%d").to_string();
        let check_out_str = check_out.format("%Y-%m-%d").to_string();
        let query = [
            ("hotelIds", hotel_id),
            ("checkInDate", check_in_str.as_str()),
            ("checkOutDate", check_out_str.as_str()),
            ("currency", currency),
        ];

        let response: DataList<RawHotelOffers> = match self.get_json(HOTEL_OFFERS_PATH, &query).await {
            Ok(response) => response,
            Err(ScoutError::Api { status, .. }) => {
                debug!(status, "No offers for hotel");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let offer = response
            .data
            .into_iter()
            .next()
            .and_then(|h| h.offers.into_iter().next())
            .map(|o| to_hotel_offer(o, check_in, check_out, currency));

        Ok(offer)
    }
}

fn to_hotel_offer(raw: RawOffer, check_in: NaiveDate, check_out: NaiveDate, currency: &str) -> HotelOffer {
    HotelOffer {
        total: raw.price.total.unwrap_or_else(|| "N/A".to_string()),
        currency: raw.price.currency.unwrap_or_else(|| currency.to_string()),
        check_in: raw.check_in_date.unwrap_or(check_in),
        check_out: raw.check_out_date.unwrap_or(check_out),
    }
}
