// --- File: crates/autoservice_booking/src/error.rs ---
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::form::Field;
use autoservice_common::models::TimeSlot;
use autoservice_common::{AutoserviceError, BackendError};

/// Why a slot could not be picked. The display text is shown to the customer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("Это время уже занято. Пожалуйста, выберите другое.")]
    Occupied(TimeSlot),

    #[error("Время {0} отсутствует в расписании")]
    Unknown(TimeSlot),

    #[error("Сначала выберите дату")]
    NoDate,

    #[error("Свободное время ещё загружается")]
    NotLoaded,

    /// Bookings are paused; the message comes from the status check.
    #[error("{0}")]
    Paused(String),
}

/// Why a calendar date could not be picked.
#[derive(Error, Debug)]
pub enum DateError {
    #[error("Дата {0} недоступна для записи")]
    NotSelectable(NaiveDate),

    #[error("{0}")]
    Paused(String),

    /// The date was selected but its slots could not be loaded.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    /// Nothing was sent; every invalid field now shows its message.
    #[error("{} field(s) invalid, first: {first_invalid:?}", .errors.len())]
    Validation {
        first_invalid: Field,
        errors: BTreeMap<Field, String>,
    },

    /// Bookings are paused (or the status is unknown); the message comes from the backend.
    #[error("{0}")]
    BookingPaused(String),

    #[error("A submission is already in progress")]
    AlreadyInFlight,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SubmitError {
    /// Text for the error banner, if this outcome shows one.
    pub fn banner_text(&self) -> Option<String> {
        match self {
            SubmitError::Validation { .. } | SubmitError::AlreadyInFlight => None,
            SubmitError::BookingPaused(message) => Some(message.clone()),
            SubmitError::Backend(err) => Some(err.user_message()),
        }
    }
}

impl From<SubmitError> for AutoserviceError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation { .. } => AutoserviceError::ValidationError(err.to_string()),
            SubmitError::BookingPaused(message) => AutoserviceError::ConflictError(message),
            SubmitError::AlreadyInFlight => AutoserviceError::ConflictError(err.to_string()),
            SubmitError::Backend(inner) => inner.into(),
        }
    }
}
