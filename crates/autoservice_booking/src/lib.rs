// --- File: crates/autoservice_booking/src/lib.rs ---
// Declare modules within this crate
pub mod availability;
pub mod banner;
pub mod calendar;
pub mod clock;
pub mod controller;
pub mod error;
pub mod form;
pub mod region;
pub mod service;
#[cfg(test)]
mod service_test;
pub mod slots;
pub mod status;
pub mod submission;

// Re-export the types an embedding page works with
pub use availability::{AvailabilityState, DateAvailabilityStore};
pub use banner::{Banner, BannerKind, BannerSlot};
pub use calendar::{BookingHorizon, CalendarCell, CalendarView, MonthGrid};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{BookingController, BookingSettings, SessionSnapshot};
pub use error::{DateError, SlotError, SubmitError};
pub use form::{BookingForm, Field, FormValues, SelectionContext, ValidationReport};
pub use region::{RegionState, SubmitState};
pub use service::SheetsBackend;
pub use slots::{SlotCache, SlotGrid, SlotSelector, SlotState, SlotView};
pub use status::StatusGate;
pub use submission::{send_with_retry, SubmitPolicy};
