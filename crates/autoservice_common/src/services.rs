// --- File: crates/autoservice_common/src/services.rs ---
//! Service abstraction for the spreadsheet backend.
//!
//! The booking widgets and the admin console only ever talk to the backend through
//! this trait, so the HTTP implementation can be swapped for an in-memory one in tests.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BackendError;
use crate::models::{BookingRequest, BookingStatus, BookingSummary, DayAvailability, SlotAnswer};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Operations offered by the booking backend.
pub trait BookingBackend: Send + Sync {
    /// `GET ?action=getBookingStatus`
    fn booking_status(&self) -> BoxFuture<'_, BookingStatus, BackendError>;

    /// `GET ?action=getAvailableSlots&date=YYYY-MM-DD`
    fn available_slots(&self, date: NaiveDate) -> BoxFuture<'_, SlotAnswer, BackendError>;

    /// `GET ?action=getDateAvailability&startDate=..&endDate=..` (both inclusive)
    fn date_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, BTreeMap<NaiveDate, DayAvailability>, BackendError>;

    /// `POST {action: "newBooking", ...}`; returns the backend's message, if any.
    fn submit_booking<'a>(
        &'a self,
        request: &'a BookingRequest,
    ) -> BoxFuture<'a, Option<String>, BackendError>;

    /// `POST {action: "toggleBooking", status}`; returns the backend's message, if any.
    fn toggle_booking(&self, active: bool) -> BoxFuture<'_, Option<String>, BackendError>;

    /// `GET ?action=getRecentBookings`
    fn recent_bookings(&self) -> BoxFuture<'_, Vec<BookingSummary>, BackendError>;
}

impl<T: BookingBackend + ?Sized> BookingBackend for Arc<T> {
    fn booking_status(&self) -> BoxFuture<'_, BookingStatus, BackendError> {
        (**self).booking_status()
    }

    fn available_slots(&self, date: NaiveDate) -> BoxFuture<'_, SlotAnswer, BackendError> {
        (**self).available_slots(date)
    }

    fn date_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, BTreeMap<NaiveDate, DayAvailability>, BackendError> {
        (**self).date_availability(start, end)
    }

    fn submit_booking<'a>(
        &'a self,
        request: &'a BookingRequest,
    ) -> BoxFuture<'a, Option<String>, BackendError> {
        (**self).submit_booking(request)
    }

    fn toggle_booking(&self, active: bool) -> BoxFuture<'_, Option<String>, BackendError> {
        (**self).toggle_booking(active)
    }

    fn recent_bookings(&self) -> BoxFuture<'_, Vec<BookingSummary>, BackendError> {
        (**self).recent_bookings()
    }
}
