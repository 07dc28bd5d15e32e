// --- File: crates/autoservice_admin/src/console.rs ---
use constant_time_eq::constant_time_eq;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AdminError;
use crate::session::{SessionStore, AUTH_KEY};
use autoservice_booking::banner::{Banner, BannerSlot};
use autoservice_common::models::{BookingStatus, BookingSummary};
use autoservice_common::BookingBackend;
use autoservice_config::models::{AdminConfig, BannerConfig};

/// The status line of the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatusView {
    NotLoaded,
    Active { message: String },
    Paused { message: String },
    LoadFailed,
}

impl StatusView {
    pub fn label(&self) -> &'static str {
        match self {
            StatusView::NotLoaded => "Загрузка...",
            StatusView::Active { .. } => "ЗАПИСЬ АКТИВНА",
            StatusView::Paused { .. } => "ЗАПИСЬ ПРИОСТАНОВЛЕНА",
            StatusView::LoadFailed => "Ошибка загрузки",
        }
    }
}

/// One line of the recent bookings list, with placeholders for missing columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRow {
    pub date: String,
    pub time: String,
    pub name: String,
    pub phone: String,
    pub service: String,
    pub car_model: String,
    pub comments: Option<String>,
}

impl From<BookingSummary> for BookingRow {
    fn from(summary: BookingSummary) -> Self {
        fn or(value: Option<String>, placeholder: &str) -> String {
            value.unwrap_or_else(|| placeholder.to_string())
        }
        Self {
            date: or(summary.date, "Дата не указана"),
            time: or(summary.time, "Время не указано"),
            name: or(summary.name, "Имя не указано"),
            phone: or(summary.phone, "Не указан"),
            service: or(summary.service, "Не указана"),
            car_model: or(summary.car_model, "Не указана"),
            comments: summary.comments,
        }
    }
}

/// Operator page: a password gate in front of the status toggle and the bookings list.
pub struct AdminConsole<B, S> {
    backend: B,
    store: S,
    shared_secret: Option<String>,
    status: StatusView,
    banners: BannerSlot,
}

impl<B: BookingBackend, S: SessionStore> AdminConsole<B, S> {
    pub fn new(backend: B, store: S, admin: &AdminConfig, banners: &BannerConfig) -> Self {
        let shared_secret = admin
            .shared_secret
            .clone()
            .filter(|secret| !secret.is_empty());
        if shared_secret.is_none() {
            warn!("admin.shared_secret is not set, the console cannot be unlocked");
        }
        Self {
            backend,
            store,
            shared_secret,
            status: StatusView::NotLoaded,
            banners: BannerSlot::from_config(banners),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get(AUTH_KEY).as_deref() == Some("true")
    }

    fn require_login(&self) -> Result<(), AdminError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AdminError::NotAuthenticated)
        }
    }

    pub fn login(&mut self, password: &str) -> Result<(), AdminError> {
        if password.is_empty() {
            return Err(AdminError::EmptyPassword);
        }
        let Some(secret) = self.shared_secret.as_deref() else {
            return Err(AdminError::NotConfigured);
        };
        if !constant_time_eq(password.as_bytes(), secret.as_bytes()) {
            warn!("admin login rejected");
            return Err(AdminError::WrongPassword);
        }
        self.store.set(AUTH_KEY, "true");
        info!("admin logged in");
        Ok(())
    }

    pub fn logout(&mut self) {
        self.store.remove(AUTH_KEY);
        self.status = StatusView::NotLoaded;
        self.banners.dismiss();
        info!("admin logged out");
    }

    pub fn status(&self) -> &StatusView {
        &self.status
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banners.visible()
    }

    pub fn tick(&mut self) -> bool {
        self.banners.tick()
    }

    /// Reads the current status into the status line.
    pub async fn load_status(&mut self) -> Result<BookingStatus, AdminError> {
        self.require_login()?;
        match self.backend.booking_status().await {
            Ok(status) => {
                self.status = if status.is_active {
                    StatusView::Active {
                        message: status.message.clone(),
                    }
                } else {
                    StatusView::Paused {
                        message: status.message.clone(),
                    }
                };
                Ok(status)
            }
            Err(err) => {
                warn!("admin status load failed: {}", err);
                self.status = StatusView::LoadFailed;
                Err(err.into())
            }
        }
    }

    /// Switches bookings on or off, then re-reads the status.
    pub async fn toggle(&mut self, active: bool) -> Result<(), AdminError> {
        self.require_login()?;
        match self.backend.toggle_booking(active).await {
            Ok(message) => {
                info!("bookings switched {}", if active { "on" } else { "off" });
                let fallback = if active {
                    "Запись включена"
                } else {
                    "Запись приостановлена"
                };
                self.banners
                    .show_success(message.unwrap_or_else(|| fallback.to_string()));
                if let Err(err) = self.load_status().await {
                    warn!("status reload after toggle failed: {}", err);
                }
                Ok(())
            }
            Err(err) => {
                let err = AdminError::from(err);
                self.banners.show_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Newest bookings as shown in the list. Nothing is made up when the call fails.
    pub async fn recent_bookings(&mut self) -> Result<Vec<BookingRow>, AdminError> {
        self.require_login()?;
        match self.backend.recent_bookings().await {
            Ok(bookings) => Ok(bookings.into_iter().map(BookingRow::from).collect()),
            Err(err) => {
                let err = AdminError::from(err);
                self.banners.show_error(err.to_string());
                Err(err)
            }
        }
    }
}
