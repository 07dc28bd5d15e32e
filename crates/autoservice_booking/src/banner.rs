// --- File: crates/autoservice_booking/src/banner.rs ---
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use autoservice_config::models::BannerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerKind {
    Success,
    Error,
}

/// A dismissible message that hides itself after `ttl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Banner {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.ttl
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(now.saturating_duration_since(self.shown_at))
    }
}

/// Holds at most one banner; a new one replaces the old.
#[derive(Debug, Clone)]
pub struct BannerSlot {
    current: Option<Banner>,
    success_ttl: Duration,
    error_ttl: Duration,
}

impl Default for BannerSlot {
    fn default() -> Self {
        Self::from_config(&BannerConfig::default())
    }
}

impl BannerSlot {
    pub fn from_config(config: &BannerConfig) -> Self {
        Self {
            current: None,
            success_ttl: Duration::from_secs(config.success_secs),
            error_ttl: Duration::from_secs(config.error_secs),
        }
    }

    pub fn show_success(&mut self, text: impl Into<String>) {
        self.show(BannerKind::Success, text.into(), self.success_ttl);
    }

    pub fn show_error(&mut self, text: impl Into<String>) {
        self.show(BannerKind::Error, text.into(), self.error_ttl);
    }

    fn show(&mut self, kind: BannerKind, text: String, ttl: Duration) {
        self.current = Some(Banner {
            kind,
            text,
            shown_at: Instant::now(),
            ttl,
        });
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// The banner still on screen, if any.
    pub fn visible(&self) -> Option<&Banner> {
        self.current
            .as_ref()
            .filter(|banner| !banner.is_expired(Instant::now()))
    }

    /// Drops an expired banner. Returns true if something disappeared.
    pub fn tick(&mut self) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|banner| banner.is_expired(Instant::now()));
        if expired {
            self.current = None;
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn success_banner_lives_eight_seconds() {
        let mut slot = BannerSlot::default();
        slot.show_success("Спасибо!");
        tokio::time::advance(Duration::from_secs(7)).await;
        assert_eq!(slot.visible().unwrap().kind, BannerKind::Success);
        assert!(!slot.tick());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(slot.visible().is_none());
        assert!(slot.tick());
    }

    #[tokio::test(start_paused = true)]
    async fn error_banner_lives_five_seconds_and_can_be_dismissed() {
        let mut slot = BannerSlot::default();
        slot.show_error("Ошибка");
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(
            slot.visible().unwrap().remaining(Instant::now()),
            Duration::from_secs(1)
        );
        slot.dismiss();
        assert!(slot.visible().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn new_banner_replaces_old() {
        let mut slot = BannerSlot::default();
        slot.show_error("Ошибка");
        slot.show_success("Готово");
        assert_eq!(slot.visible().unwrap().text, "Готово");
    }
}
