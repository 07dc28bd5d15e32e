// --- File: crates/autoservice_booking/src/availability.rs ---
//! Per-day slot counts for the visible calendar window.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use autoservice_common::models::DayAvailability;
use autoservice_common::BackendError;

/// State of the availability region of the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityState {
    /// Nothing fetched yet, or invalidated.
    Empty,
    Loading { start: NaiveDate, end: NaiveDate },
    Loaded { start: NaiveDate, end: NaiveDate },
    /// The last fetch failed; counts shown are not authoritative.
    Degraded { start: NaiveDate, end: NaiveDate, reason: String },
}

/// Holds what the backend reported per date for the current window.
#[derive(Debug, Clone)]
pub struct DateAvailabilityStore {
    days: BTreeMap<NaiveDate, DayAvailability>,
    state: AvailabilityState,
    generation: u64,
}

impl Default for DateAvailabilityStore {
    fn default() -> Self {
        Self {
            days: BTreeMap::new(),
            state: AvailabilityState::Empty,
            generation: 0,
        }
    }
}

/// Identifies one fetch so that late answers for an old window are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityTicket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    generation: u64,
}

impl DateAvailabilityStore {
    pub fn get(&self, date: NaiveDate) -> DayAvailability {
        self.days
            .get(&date)
            .copied()
            .unwrap_or(DayAvailability::Unknown)
    }

    pub fn state(&self) -> &AvailabilityState {
        &self.state
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.state, AvailabilityState::Degraded { .. })
    }

    /// Starts a fetch for `[start, end]`; any fetch started earlier becomes stale.
    pub fn begin(&mut self, start: NaiveDate, end: NaiveDate) -> AvailabilityTicket {
        self.generation += 1;
        self.state = AvailabilityState::Loading { start, end };
        AvailabilityTicket {
            start,
            end,
            generation: self.generation,
        }
    }

    /// Applies the outcome of a fetch. Returns false when the ticket is stale.
    ///
    /// A success replaces the whole store. A failure clears every count and marks the
    /// window degraded; nothing is made up in place of the missing data.
    pub fn finish(
        &mut self,
        ticket: AvailabilityTicket,
        result: Result<BTreeMap<NaiveDate, DayAvailability>, BackendError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "dropping stale availability for {}..{}",
                ticket.start, ticket.end
            );
            return false;
        }
        let AvailabilityTicket { start, end, .. } = ticket;
        match result {
            Ok(days) => {
                self.days = days
                    .into_iter()
                    .filter(|(date, _)| *date >= start && *date <= end)
                    .collect();
                self.state = AvailabilityState::Loaded { start, end };
            }
            Err(err) => {
                warn!("date availability for {}..{} unavailable: {}", start, end, err);
                self.days.clear();
                self.state = AvailabilityState::Degraded {
                    start,
                    end,
                    reason: err.user_message(),
                };
            }
        }
        true
    }

    /// Drops everything; the next render fetches again.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.days.clear();
        self.state = AvailabilityState::Empty;
    }
}
