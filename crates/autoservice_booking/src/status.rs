// --- File: crates/autoservice_booking/src/status.rs ---
//! Whether the booking form currently accepts submissions.
//!
//! The gate fails closed: until the backend has confirmed that bookings are active, and
//! whenever the status cannot be read, submission is blocked.

use tracing::{debug, info, warn};

use autoservice_common::models::{BookingStatus, StatusSource};
use autoservice_common::BackendError;

pub const STATUS_UNAVAILABLE_MESSAGE: &str =
    "Не удалось проверить доступность записи. Попробуйте позже.";
pub const PAUSED_DEFAULT_MESSAGE: &str =
    "Запись временно приостановлена. Пожалуйста, попробуйте позже.";
pub const STATUS_PENDING_MESSAGE: &str = "Проверяем доступность записи...";

#[derive(Debug, Default, Clone)]
pub struct StatusGate {
    status: Option<BookingStatus>,
}

impl StatusGate {
    pub fn status(&self) -> Option<&BookingStatus> {
        self.status.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.is_active)
    }

    /// The message to show instead of the form, if the form is blocked.
    pub fn blocking_message(&self) -> Option<String> {
        match &self.status {
            None => Some(STATUS_PENDING_MESSAGE.to_string()),
            Some(status) if !status.is_active => Some(status.message.clone()),
            Some(_) => None,
        }
    }

    /// Records the outcome of a status check. Returns true when the active flag or the
    /// message differs from the previous check.
    pub fn apply(&mut self, result: Result<BookingStatus, BackendError>) -> bool {
        let next = match result {
            Ok(mut status) => {
                if !status.is_active && status.message.trim().is_empty() {
                    status.message = PAUSED_DEFAULT_MESSAGE.to_string();
                }
                status
            }
            Err(err) => {
                warn!("booking status unavailable, closing the form: {}", err);
                BookingStatus {
                    is_active: false,
                    message: STATUS_UNAVAILABLE_MESSAGE.to_string(),
                    source: StatusSource::Fallback,
                }
            }
        };

        let changed = self
            .status
            .as_ref()
            .is_some_and(|prev| {
                prev.is_active != next.is_active || prev.message != next.message
            });
        if changed {
            info!(
                "booking status changed: active={} ({:?})",
                next.is_active, next.source
            );
        } else {
            debug!("booking status: active={}", next.is_active);
        }
        self.status = Some(next);
        changed
    }
}
