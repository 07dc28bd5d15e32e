// --- File: crates/autoservice_booking/src/controller.rs ---
//! The booking page session.
//!
//! `BookingController` owns all page state (calendar, availability, slots, form, status,
//! banners) and is driven by discrete events. Backend calls never run under the session
//! lock; their results are applied only if the selection they were started for is still
//! current.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::availability::{AvailabilityState, DateAvailabilityStore};
use crate::banner::{Banner, BannerSlot};
use crate::calendar::{BookingHorizon, CalendarView, MonthGrid};
use crate::clock::{Clock, SystemClock};
use crate::error::{DateError, SlotError, SubmitError};
use crate::form::{BookingForm, Field, FormValues, SelectionContext};
use crate::region::{RegionState, SubmitState};
use crate::service::SheetsBackend;
use crate::slots::{SlotGrid, SlotLoad, SlotSelector, SlotView};
use crate::status::StatusGate;
use crate::submission::{send_with_retry, SubmitPolicy};
use autoservice_common::models::{BookingRequest, BookingStatus, TimeSlot};
use autoservice_common::{config_error, AutoserviceError, BackendError, BookingBackend};
use autoservice_config::models::{AppConfig, BannerConfig, BookingConfig, InvalidConfig};

/// Everything the controller needs from the configuration.
#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub horizon_days: u32,
    pub grid: SlotGrid,
    pub services: Vec<String>,
    pub collect_time: bool,
    pub policy: SubmitPolicy,
    pub banners: BannerConfig,
    pub poll_interval: Duration,
}

impl Default for BookingSettings {
    fn default() -> Self {
        let booking = BookingConfig::default();
        Self {
            horizon_days: booking.horizon_days,
            grid: SlotGrid::default(),
            services: booking.services,
            collect_time: booking.collect_time,
            policy: SubmitPolicy::default(),
            banners: BannerConfig::default(),
            poll_interval: Duration::from_secs(300),
        }
    }
}

impl BookingSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, InvalidConfig> {
        Ok(Self {
            horizon_days: config.booking.horizon_days,
            grid: SlotGrid::from_config(&config.booking)?,
            services: config.booking.services.clone(),
            collect_time: config.booking.collect_time,
            policy: SubmitPolicy::from_config(&config.submission),
            banners: config.banners.clone(),
            poll_interval: Duration::from_secs(config.status.poll_interval_secs.max(1)),
        })
    }
}

struct BookingSession {
    calendar: CalendarView,
    availability: DateAvailabilityStore,
    slots: SlotSelector,
    form: BookingForm,
    status: StatusGate,
    submit: SubmitState,
    banners: BannerSlot,
}

/// What the page should show right now.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub month: MonthGrid,
    pub availability: AvailabilityState,
    pub slots: RegionState<SlotView>,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<TimeSlot>,
    pub values: FormValues,
    pub errors: BTreeMap<Field, String>,
    pub status: Option<BookingStatus>,
    /// Shown in place of the form while bookings are not accepted.
    pub status_message: Option<String>,
    pub form_enabled: bool,
    pub submit_enabled: bool,
    pub submit: SubmitState,
    pub banner: Option<Banner>,
}

/// Releases the single-submission guard and re-enables the button on every exit path,
/// including a dropped future.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    session: &'a Mutex<BookingSession>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if session.submit.is_busy() {
            session.submit = SubmitState::Idle;
        }
        self.flag.store(false, Ordering::Release);
    }
}

pub struct BookingController<B, C> {
    backend: B,
    clock: C,
    settings: BookingSettings,
    session: Mutex<BookingSession>,
    submitting: AtomicBool,
}

impl BookingController<SheetsBackend, SystemClock> {
    /// Wires the HTTP backend and the real clock from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, AutoserviceError> {
        let settings = BookingSettings::from_config(config).map_err(config_error)?;
        let tz = config.booking.time_zone().map_err(config_error)?;
        let backend = SheetsBackend::new(&config.backend)?;
        Ok(Self::new(backend, SystemClock::new(tz), settings))
    }
}

impl<B: BookingBackend, C: Clock> BookingController<B, C> {
    pub fn new(backend: B, clock: C, settings: BookingSettings) -> Self {
        let session = BookingSession {
            calendar: CalendarView::containing(clock.today()),
            availability: DateAvailabilityStore::default(),
            slots: SlotSelector::new(settings.grid),
            form: BookingForm::new(settings.services.clone(), settings.collect_time),
            status: StatusGate::default(),
            submit: SubmitState::Idle,
            banners: BannerSlot::from_config(&settings.banners),
        };
        Self {
            backend,
            clock,
            settings,
            session: Mutex::new(session),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &BookingSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, BookingSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn horizon(&self) -> BookingHorizon {
        BookingHorizon::new(self.clock.today(), self.settings.horizon_days)
    }

    fn selection(&self, session: &BookingSession) -> SelectionContext {
        SelectionContext {
            date: session.slots.date(),
            time: session.slots.selected(),
            horizon: self.horizon(),
        }
    }

    /// Page load: check the status, then fetch availability for the visible month.
    pub async fn start(&self) {
        info!("booking session started for {}", self.clock.today());
        self.refresh_status().await;
        self.refresh_availability().await;
    }

    /// Re-fetches per-day availability for the part of the shown month inside the horizon.
    pub async fn refresh_availability(&self) {
        let horizon = self.horizon();
        let ticket = {
            let mut session = self.lock();
            match session.calendar.visible_window(&horizon) {
                Some((start, end)) => session.availability.begin(start, end),
                None => return,
            }
        };
        let result = self
            .backend
            .date_availability(ticket.start, ticket.end)
            .await;
        self.lock().availability.finish(ticket, result);
    }

    /// Moves the calendar by `delta` months. Returns false if the move is out of range.
    pub async fn navigate(&self, delta: i32) -> bool {
        let horizon = self.horizon();
        let moved = self.lock().calendar.navigate(delta, &horizon);
        if moved {
            self.refresh_availability().await;
        }
        moved
    }

    pub fn render_month(&self) -> MonthGrid {
        let horizon = self.horizon();
        let session = self.lock();
        session
            .calendar
            .render(&horizon, &session.availability, session.slots.date())
    }

    /// Picks a date and loads its slots (from the cache when possible).
    ///
    /// Returns `Ok(None)` when another date was picked before the slots arrived.
    pub async fn select_date(&self, date: NaiveDate) -> Result<Option<SlotView>, DateError> {
        let horizon = self.horizon();
        {
            let mut session = self.lock();
            if let Some(message) = session.status.blocking_message() {
                return Err(DateError::Paused(message));
            }
            if !session.calendar.is_selectable(date, &horizon) {
                return Err(DateError::NotSelectable(date));
            }
            session.form.clear_error(Field::Date);
        }
        Ok(self.load_for_date(date).await?)
    }

    /// Cache-first load of the slots for `date`, making it the current date.
    ///
    /// At most one backend call per date until the cache is invalidated. Returns
    /// `Ok(None)` when another date became current before the answer arrived.
    pub async fn load_for_date(&self, date: NaiveDate) -> Result<Option<SlotView>, BackendError> {
        let now = self.clock.now();
        let ticket = match self.lock().slots.begin_load(date, now) {
            SlotLoad::Cached(view) => return Ok(Some(view)),
            SlotLoad::Fetch(ticket) => ticket,
        };

        debug!("fetching slots for {}", date);
        let result = self.backend.available_slots(date).await;
        self.lock().slots.finish_load(ticket, result, now)
    }

    pub fn select_slot(&self, slot: TimeSlot) -> Result<(), SlotError> {
        let mut session = self.lock();
        if let Some(message) = session.status.blocking_message() {
            return Err(SlotError::Paused(message));
        }
        session.slots.select(slot)?;
        session.form.clear_error(Field::Time);
        Ok(())
    }

    /// Stores a typed value verbatim. Returns false for fields that are not typed in.
    pub fn set_field(&self, field: Field, value: impl Into<String>) -> bool {
        self.lock().form.set_field(field, value)
    }

    /// Phone keystrokes, passed through the input mask.
    pub fn type_phone(&self, input: &str) {
        self.lock().form.type_phone(input);
    }

    pub fn set_agree(&self, agree: bool) {
        self.lock().form.set_agree(agree);
    }

    /// A field lost focus: show or hide its message.
    pub fn blur(&self, field: Field) -> bool {
        let mut session = self.lock();
        let ctx = self.selection(&session);
        session.form.validate_field(field, &ctx)
    }

    /// Validates, checks the gate, sends the booking and updates the page with the outcome.
    pub async fn submit(&self) -> Result<String, SubmitError> {
        if self.submitting.swap(true, Ordering::AcqRel) {
            debug!("submit ignored, another submission is in flight");
            return Err(SubmitError::AlreadyInFlight);
        }
        let _guard = InFlightGuard {
            flag: &self.submitting,
            session: &self.session,
        };

        let request = match self.prepare_request() {
            Ok(request) => request,
            Err(err) => {
                if let Some(text) = err.banner_text() {
                    self.lock().banners.show_error(text);
                }
                return Err(err);
            }
        };
        let result = send_with_retry(&self.backend, &request, &self.settings.policy).await;

        match result {
            Ok(_) => {
                let text = success_text(&request);
                {
                    let mut session = self.lock();
                    session.banners.show_success(text.clone());
                    session.form.reset();
                    session.slots.clear_selection();
                    session.slots.invalidate();
                    session.availability.invalidate();
                    session.submit = SubmitState::Succeeded(text.clone());
                }
                self.refresh_availability().await;
                Ok(text)
            }
            Err(err) => {
                let err = SubmitError::Backend(err);
                let message = err.banner_text().unwrap_or_else(|| err.to_string());
                {
                    let mut session = self.lock();
                    session.banners.show_error(message.clone());
                    session.submit = SubmitState::Failed(message);
                }
                Err(err)
            }
        }
    }

    fn prepare_request(&self) -> Result<BookingRequest, SubmitError> {
        let mut session = self.lock();
        let ctx = self.selection(&session);
        let report = session.form.validate_form(&ctx);
        if let Some(first_invalid) = report.first_invalid() {
            debug!("submission blocked by validation, first invalid: {:?}", first_invalid);
            return Err(SubmitError::Validation {
                first_invalid,
                errors: report.errors,
            });
        }

        if let Some(message) = session.status.blocking_message() {
            info!("submission blocked, bookings are not accepted");
            return Err(SubmitError::BookingPaused(message));
        }

        let request = session
            .form
            .to_request(&ctx, self.clock.utc_now(), Uuid::new_v4())
            .map_err(|report| SubmitError::Validation {
                first_invalid: report.first_invalid().unwrap_or(Field::Name),
                errors: report.errors,
            })?;
        session.submit = SubmitState::Submitting;
        Ok(request)
    }

    /// Re-reads the booking status. A change invalidates cached slots and availability.
    pub async fn refresh_status(&self) -> bool {
        let result = self.backend.booking_status().await;
        let changed = {
            let mut session = self.lock();
            let changed = session.status.apply(result);
            if changed {
                session.slots.invalidate();
                session.availability.invalidate();
            }
            changed
        };
        if changed {
            self.refresh_availability().await;
        }
        changed
    }

    /// The page became visible again (or hidden).
    pub async fn on_visibility_changed(&self, visible: bool) {
        if visible {
            debug!("page visible again, re-checking booking status");
            self.refresh_status().await;
        }
    }

    /// Someone else changed bookings or the status: drop every cache and re-read.
    pub async fn on_status_updated(&self) {
        {
            let mut session = self.lock();
            session.slots.invalidate();
            session.availability.invalidate();
        }
        self.refresh_status().await;
        self.refresh_availability().await;
    }

    /// Expires banners. Returns true if one disappeared.
    pub fn tick(&self) -> bool {
        self.lock().banners.tick()
    }

    pub fn dismiss_banner(&self) {
        self.lock().banners.dismiss();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let horizon = self.horizon();
        let session = self.lock();
        let status_message = session.status.blocking_message();
        let form_enabled = status_message.is_none();
        let busy = session.submit.is_busy() || self.submitting.load(Ordering::Acquire);
        SessionSnapshot {
            month: session
                .calendar
                .render(&horizon, &session.availability, session.slots.date()),
            availability: session.availability.state().clone(),
            slots: session.slots.region().clone(),
            selected_date: session.slots.date(),
            selected_time: session.slots.selected(),
            values: session.form.values().clone(),
            errors: session.form.errors().clone(),
            status: session.status.status().cloned(),
            status_message,
            form_enabled,
            submit_enabled: form_enabled && !busy,
            submit: session.submit.clone(),
            banner: session.banners.visible().cloned(),
        }
    }

    pub fn is_slot_cached(&self, date: NaiveDate) -> bool {
        self.lock().slots.cache().contains(date)
    }
}

impl<B, C> BookingController<B, C>
where
    B: BookingBackend + 'static,
    C: Clock + 'static,
{
    /// Re-checks the status every poll interval until the controller is dropped.
    pub fn spawn_status_polling(self: &Arc<Self>) -> JoinHandle<()> {
        let period = self.settings.poll_interval;
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                let Some(controller) = weak.upgrade() else {
                    debug!("booking session dropped, status polling stops");
                    break;
                };
                if controller.refresh_status().await {
                    warn!("booking status changed during the session");
                }
            }
        })
    }
}

fn success_text(request: &BookingRequest) -> String {
    let date = request.date.format("%Y-%m-%d");
    match request.time {
        Some(time) => format!(
            "Спасибо, {}! Вы записаны на {} в {}.",
            request.name, date, time
        ),
        None => format!("Спасибо, {}! Вы записаны на {}.", request.name, date),
    }
}
