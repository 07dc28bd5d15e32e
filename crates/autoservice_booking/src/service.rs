// --- File: crates/autoservice_booking/src/service.rs ---
//! HTTP implementation of `BookingBackend` for the spreadsheet script backend.
//!
//! Reads are `GET <url>?action=...`; writes are a `POST` of a JSON body. Every answer is
//! a `result`-tagged envelope which is checked here, before anything reaches the widgets.

use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use autoservice_common::logging::mask_phone;
use autoservice_common::models::{
    BookingRequest, BookingStatus, BookingSummary, DayAvailability, SlotAnswer, StatusSource,
    TimeSlot,
};
use autoservice_common::{action_url, create_client, BackendError, BookingBackend, BoxFuture};
use autoservice_config::models::BackendConfig;

const DEFAULT_REJECTION: &str = "Сервер отклонил запрос";

/// Talks to the deployed spreadsheet script.
#[derive(Debug, Clone)]
pub struct SheetsBackend {
    client: Client,
    base_url: Url,
    post_content_type: String,
    request_timeout: Duration,
}

impl SheetsBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.url)
            .map_err(|err| BackendError::InvalidUrl(format!("{}: {}", config.url, err)))?;
        let client =
            create_client(config.request_timeout_secs, true).map_err(BackendError::Request)?;
        Ok(Self {
            client,
            base_url,
            post_content_type: config.post_content_type.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> BackendError {
        BackendError::from_transport(err, self.request_timeout)
    }

    async fn get<P, T>(&self, params: &P) -> Result<T, BackendError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let url = action_url(self.base_url.as_str(), params)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        parse_envelope(&self.read_body(response).await?)
    }

    async fn post<P, T>(&self, body: &P) -> Result<T, BackendError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.base_url.clone())
            .header(CONTENT_TYPE, self.post_content_type.as_str())
            .body(serde_json::to_string(body)?)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        parse_envelope(&self.read_body(response).await?)
    }

    async fn read_body(&self, response: Response) -> Result<String, BackendError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status_code: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Splits a `{"result": "success" | "error", ...}` envelope.
pub(crate) fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    let value: Value = serde_json::from_str(body)?;
    match value.get("result").and_then(Value::as_str) {
        Some("success") => serde_json::from_value(value).map_err(Into::into),
        Some("error") => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_REJECTION);
            Err(BackendError::Rejected(message.to_string()))
        }
        Some(other) => Err(BackendError::Parse(format!("unknown result '{other}'"))),
        None => Err(BackendError::Parse("missing 'result' field".into())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPayload {
    is_active: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotsPayload {
    #[serde(default)]
    available_slots: Option<Vec<TimeSlot>>,
    #[serde(default)]
    occupied_slots: Option<Vec<TimeSlot>>,
    #[serde(default)]
    day_off: Option<bool>,
}

impl TryFrom<SlotsPayload> for SlotAnswer {
    type Error = BackendError;

    fn try_from(payload: SlotsPayload) -> Result<Self, Self::Error> {
        match payload {
            SlotsPayload {
                day_off: Some(true),
                ..
            } => Ok(SlotAnswer::DayOff),
            SlotsPayload {
                available_slots: Some(slots),
                ..
            } => Ok(SlotAnswer::Available(slots)),
            SlotsPayload {
                occupied_slots: Some(slots),
                ..
            } => Ok(SlotAnswer::Occupied(slots)),
            _ => Err(BackendError::Parse(
                "slot answer carries neither availableSlots, occupiedSlots nor dayOff".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DayValue {
    Count(u32),
    Flag(bool),
}

impl From<DayValue> for DayAvailability {
    fn from(value: DayValue) -> Self {
        match value {
            DayValue::Count(n) => DayAvailability::Open(n),
            DayValue::Flag(false) => DayAvailability::DayOff,
            DayValue::Flag(true) => DayAvailability::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateAvailabilityPayload {
    date_availability: BTreeMap<NaiveDate, DayValue>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentBookingsPayload {
    #[serde(default)]
    bookings: Vec<BookingSummary>,
}

#[derive(Serialize)]
struct NewBookingBody<'a> {
    action: &'static str,
    #[serde(flatten)]
    request: &'a BookingRequest,
}

#[derive(Serialize)]
struct ToggleBody {
    action: &'static str,
    status: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    action: &'static str,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl BookingBackend for SheetsBackend {
    fn booking_status(&self) -> BoxFuture<'_, BookingStatus, BackendError> {
        Box::pin(async move {
            let payload: StatusPayload = self.get(&[("action", "getBookingStatus")]).await?;
            Ok(BookingStatus {
                is_active: payload.is_active,
                message: payload.message.unwrap_or_default(),
                source: StatusSource::Backend,
            })
        })
    }

    fn available_slots(&self, date: NaiveDate) -> BoxFuture<'_, SlotAnswer, BackendError> {
        Box::pin(async move {
            let date = date.format("%Y-%m-%d").to_string();
            let payload: SlotsPayload = self
                .get(&[("action", "getAvailableSlots"), ("date", date.as_str())])
                .await?;
            SlotAnswer::try_from(payload)
        })
    }

    fn date_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, BTreeMap<NaiveDate, DayAvailability>, BackendError> {
        Box::pin(async move {
            let query = RangeQuery {
                action: "getDateAvailability",
                start_date: start,
                end_date: end,
            };
            let payload: DateAvailabilityPayload = self.get(&query).await?;
            Ok(payload
                .date_availability
                .into_iter()
                .map(|(date, value)| (date, value.into()))
                .collect())
        })
    }

    fn submit_booking<'a>(
        &'a self,
        request: &'a BookingRequest,
    ) -> BoxFuture<'a, Option<String>, BackendError> {
        Box::pin(async move {
            debug!(
                request_id = %request.request_id,
                phone = %mask_phone(&request.phone),
                "POST newBooking for {}",
                request.date
            );
            let body = NewBookingBody {
                action: "newBooking",
                request,
            };
            let payload: MessagePayload = self.post(&body).await?;
            Ok(payload.message)
        })
    }

    fn toggle_booking(&self, active: bool) -> BoxFuture<'_, Option<String>, BackendError> {
        Box::pin(async move {
            debug!("POST toggleBooking status={}", active);
            let body = ToggleBody {
                action: "toggleBooking",
                status: active,
            };
            let payload: MessagePayload = self.post(&body).await?;
            Ok(payload.message)
        })
    }

    fn recent_bookings(&self) -> BoxFuture<'_, Vec<BookingSummary>, BackendError> {
        Box::pin(async move {
            let payload: RecentBookingsPayload =
                self.get(&[("action", "getRecentBookings")]).await?;
            Ok(payload.bookings)
        })
    }
}
