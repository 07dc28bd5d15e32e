// --- File: crates/autoservice_booking/src/slots.rs ---
//! Time slots for the selected date: the canonical grid, the per-date cache and the
//! selection itself.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use crate::error::SlotError;
use crate::region::RegionState;
use autoservice_common::models::{SlotAnswer, TimeSlot};
use autoservice_common::BackendError;
use autoservice_config::models::{BookingConfig, InvalidConfig};

pub const NO_SLOTS_PLACEHOLDER: &str = "Нет доступных слотов";

/// Business hours cut into fixed steps. The closing time itself is not a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    opening: NaiveTime,
    closing: NaiveTime,
    step: Duration,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            closing: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            step: Duration::minutes(30),
        }
    }
}

impl SlotGrid {
    pub fn new(opening: NaiveTime, closing: NaiveTime, slot_minutes: u32) -> Self {
        Self {
            opening,
            closing,
            step: Duration::minutes(i64::from(slot_minutes.max(1))),
        }
    }

    pub fn from_config(config: &BookingConfig) -> Result<Self, InvalidConfig> {
        Ok(Self::new(
            config.opening()?,
            config.closing()?,
            config.slot_minutes,
        ))
    }

    pub fn slots(&self) -> Vec<TimeSlot> {
        let mut slots = Vec::new();
        let mut current = self.opening;
        while current < self.closing {
            slots.push(TimeSlot::new(current));
            let (next, wrapped) = current.overflowing_add_signed(self.step);
            if wrapped != 0 {
                break;
            }
            current = next;
        }
        slots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotState {
    Available,
    /// Rendered but disabled.
    Occupied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotEntry {
    pub slot: TimeSlot,
    pub state: SlotState,
}

/// What the slot list shows for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub date: NaiveDate,
    pub day_off: bool,
    pub entries: Vec<SlotEntry>,
}

impl SlotView {
    pub fn available(&self) -> Vec<TimeSlot> {
        self.entries
            .iter()
            .filter(|e| e.state == SlotState::Available)
            .map(|e| e.slot)
            .collect()
    }

    pub fn state_of(&self, slot: TimeSlot) -> Option<SlotState> {
        self.entries.iter().find(|e| e.slot == slot).map(|e| e.state)
    }

    pub fn is_empty(&self) -> bool {
        !self.entries.iter().any(|e| e.state == SlotState::Available)
    }

    /// Text shown instead of the list when nothing can be picked.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty().then_some(NO_SLOTS_PLACEHOLDER)
    }
}

/// What the backend said about a date, reduced to the slots a customer may pick.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedSlots {
    available: Vec<TimeSlot>,
    day_off: bool,
}

impl CachedSlots {
    fn from_answer(answer: SlotAnswer, grid: &SlotGrid) -> Self {
        match answer {
            SlotAnswer::Available(mut available) => {
                available.sort();
                available.dedup();
                Self {
                    available,
                    day_off: false,
                }
            }
            SlotAnswer::Occupied(occupied) => Self {
                available: grid
                    .slots()
                    .into_iter()
                    .filter(|slot| !occupied.contains(slot))
                    .collect(),
                day_off: false,
            },
            SlotAnswer::DayOff => Self {
                available: Vec::new(),
                day_off: true,
            },
        }
    }
}

/// Per-date slot answers for the page session. Filled at most once per date until cleared.
#[derive(Debug, Default, Clone)]
pub struct SlotCache {
    entries: HashMap<NaiveDate, CachedSlots>,
}

impl SlotCache {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn get(&self, date: NaiveDate) -> Option<&CachedSlots> {
        self.entries.get(&date)
    }

    fn insert_once(&mut self, date: NaiveDate, slots: CachedSlots) {
        self.entries.entry(date).or_insert(slots);
    }
}

/// A slot fetch that was started and has not been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTicket {
    pub date: NaiveDate,
    generation: u64,
    cache_epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotLoad {
    /// Served from the cache; no request needed.
    Cached(SlotView),
    Fetch(SlotTicket),
}

/// Loads, caches and selects time slots for the currently selected date.
#[derive(Debug, Default)]
pub struct SlotSelector {
    grid: SlotGrid,
    cache: SlotCache,
    cache_epoch: u64,
    generation: u64,
    date: Option<NaiveDate>,
    selected: Option<TimeSlot>,
    region: RegionState<SlotView>,
}

impl SlotSelector {
    pub fn new(grid: SlotGrid) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn cache(&self) -> &SlotCache {
        &self.cache
    }

    pub fn region(&self) -> &RegionState<SlotView> {
        &self.region
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn selected(&self) -> Option<TimeSlot> {
        self.selected
    }

    /// Switches to `date`. Any fetch started for an earlier date becomes stale and the
    /// previous slot selection is dropped.
    pub fn begin_load(&mut self, date: NaiveDate, now: NaiveDateTime) -> SlotLoad {
        self.generation += 1;
        self.date = Some(date);
        self.selected = None;

        if let Some(cached) = self.cache.get(date) {
            trace!("slot cache hit for {}", date);
            let view = self.build_view(date, cached, now);
            self.region = RegionState::Ready(view.clone());
            return SlotLoad::Cached(view);
        }

        self.region = RegionState::Loading;
        SlotLoad::Fetch(SlotTicket {
            date,
            generation: self.generation,
            cache_epoch: self.cache_epoch,
        })
    }

    /// Applies a fetch result.
    ///
    /// Returns `Ok(None)` when the customer has moved on to another date in the meantime;
    /// a successful stale answer is still cached, but nothing on screen changes. A failure
    /// leaves the cache untouched and puts the region into the error state.
    pub fn finish_load(
        &mut self,
        ticket: SlotTicket,
        result: Result<SlotAnswer, BackendError>,
        now: NaiveDateTime,
    ) -> Result<Option<SlotView>, BackendError> {
        let current = ticket.generation == self.generation;
        match result {
            Ok(answer) => {
                let cached = CachedSlots::from_answer(answer, &self.grid);
                if ticket.cache_epoch == self.cache_epoch {
                    self.cache.insert_once(ticket.date, cached.clone());
                }
                if !current {
                    debug!("slots for {} arrived after selection changed", ticket.date);
                    return Ok(None);
                }
                let view = self.build_view(ticket.date, &cached, now);
                self.region = RegionState::Ready(view.clone());
                Ok(Some(view))
            }
            Err(err) => {
                warn!("slot fetch for {} failed: {}", ticket.date, err);
                if current {
                    self.region = RegionState::Error(err.user_message());
                }
                Err(err)
            }
        }
    }

    /// Picks `slot`. Rejections leave the current selection as it was.
    pub fn select(&mut self, slot: TimeSlot) -> Result<(), SlotError> {
        if self.date.is_none() {
            return Err(SlotError::NoDate);
        }
        let view = self.region.ready().ok_or(SlotError::NotLoaded)?;
        match view.state_of(slot) {
            Some(SlotState::Available) => {
                self.selected = Some(slot);
                Ok(())
            }
            Some(SlotState::Occupied) => Err(SlotError::Occupied(slot)),
            None => Err(SlotError::Unknown(slot)),
        }
    }

    /// Forgets the selected date and slot.
    pub fn clear_selection(&mut self) {
        self.generation += 1;
        self.date = None;
        self.selected = None;
        self.region = RegionState::Idle;
    }

    /// Empties the cache. Fetches already in flight will not repopulate it.
    pub fn invalidate(&mut self) {
        debug!("slot cache invalidated ({} entries)", self.cache.len());
        self.cache.clear();
        self.cache_epoch += 1;
    }

    fn build_view(&self, date: NaiveDate, cached: &CachedSlots, now: NaiveDateTime) -> SlotView {
        let mut all = self.grid.slots();
        all.extend(cached.available.iter().copied());
        all.sort();
        all.dedup();

        let entries = all
            .into_iter()
            .map(|slot| {
                let started = date < now.date() || (date == now.date() && slot.time() <= now.time());
                let state = if cached.available.contains(&slot) && !started {
                    SlotState::Available
                } else {
                    SlotState::Occupied
                };
                SlotEntry { slot, state }
            })
            .collect();

        SlotView {
            date,
            day_off: cached.day_off,
            entries,
        }
    }
}
