//! WhatsApp notifications through the Twilio messages API

use crate::{Deal, ScoutError};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, instrument};

const SERVICE: &str = "twilio";

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

pub struct WhatsAppNotifier {
    http_client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    sender: String,
    recipient: String,
}

impl WhatsAppNotifier {
    pub fn new(
        base_url: &str,
        account_sid: &str,
        auth_token: &str,
        sender: &str,
        phone: &str,
    ) -> Result<Self, ScoutError> {
        Ok(Self {
            http_client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            sender: whatsapp_address(sender),
            recipient: whatsapp_address(phone),
        })
    }

    /// Send a message, returning its Twilio SID
    #[instrument(level = "info", skip(self, body))]
    pub async fn send(&self, body: &str) -> Result<String, ScoutError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let form = [
            ("From", self.sender.as_str()),
            ("To", self.recipient.as_str()),
            ("Body", body),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Message delivery failed");
            return Err(ScoutError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let message: MessageResponse = response.json().await?;
        info!(sid = %message.sid, "Message sent");
        Ok(message.sid)
    }
}

fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

/// Message body announcing a deal
pub fn format_deal_message(deal: &Deal) -> String {
    format!(
        "🌤️ *Good destination found!*\n\n\
         🏙️ City: *{}*\n\
         ✈️ Airport: *{}*\n\
         💵 Flight Price: *{} {}*\n\
         📅 Dates: {} → {}\n\
         🏨 Hotel: *{}*\n\
         💶 Price: {} {}\n\
         ☀️ Weather score: *{:.2}*\n",
        deal.city_code,
        deal.airport,
        deal.flight_price,
        deal.flight_currency,
        deal.check_in.format("%Y-%m-%d"),
        deal.check_out.format("%Y-%m-%d"),
        deal.hotel_name,
        deal.hotel_price,
        deal.currency,
        deal.weather_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_whatsapp_address() {
        assert_eq!(whatsapp_address("+381600000000"), "whatsapp:+381600000000");
        assert_eq!(whatsapp_address("whatsapp:+14155238886"), "whatsapp:+14155238886");
    }

    fn deal() -> Deal {
        Deal {
            city_code: "PAR".to_string(),
            airport: "ORY".to_string(),
            flight_price: "98.40".to_string(),
            flight_currency: "EUR".to_string(),
            hotel_name: "Hotel Lutece".to_string(),
            hotel_id: "HLPAR123".to_string(),
            hotel_price: "512.00".to_string(),
            currency: "EUR".to_string(),
            check_in: NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 8, 9).unwrap(),
            weather_score: 4.13,
        }
    }

    #[test]
    fn test_format_deal_message() {
        let message = format_deal_message(&deal());
        assert!(message.contains("City: *PAR*"));
        assert!(message.contains("Airport: *ORY*"));
        assert!(message.contains("Flight Price: *98.40 EUR*"));
        assert!(message.contains("Dates: 2025-08-02 → 2025-08-09"));
        assert!(message.contains("Hotel: *Hotel Lutece*"));
        assert!(message.contains("Price: 512.00 EUR"));
        assert!(message.contains("Weather score: *4.13*"));
    }

    #[test]
    fn test_format_deal_message_currency_and_whole_score() {
        let deal = Deal {
            flight_currency: "USD".to_string(),
            weather_score: 5.0,
            ..deal()
        };

        let message = format_deal_message(&deal);
        assert!(message.contains("Flight Price: *98.40 USD*"));
        assert!(message.contains("Weather score: *5.00*"));
    }
}
