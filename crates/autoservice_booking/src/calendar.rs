// --- File: crates/autoservice_booking/src/calendar.rs ---
//! Month grid of selectable dates bounded by the booking horizon.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::availability::DateAvailabilityStore;
use autoservice_common::models::DayAvailability;

/// Cells in a rendered month: six full weeks.
pub const GRID_CELLS: usize = 42;

const MONTH_NAMES: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь",
    "Октябрь", "Ноябрь", "Декабрь",
];

/// The rolling window `[today, today + days]` in which appointments can be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingHorizon {
    pub today: NaiveDate,
    pub days: u32,
}

impl BookingHorizon {
    pub fn new(today: NaiveDate, days: u32) -> Self {
        Self { today, days }
    }

    pub fn last_day(&self) -> NaiveDate {
        self.today
            .checked_add_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Both ends inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.today && date <= self.last_day()
    }
}

/// One day cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub selectable: bool,
    pub selected: bool,
    pub availability: DayAvailability,
}

/// A rendered month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub cells: Vec<CalendarCell>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

impl MonthGrid {
    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.date == date)
    }
}

/// The month currently shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarView {
    first_of_month: NaiveDate,
}

impl CalendarView {
    /// Shows the month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_of_month: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_of_month| Self { first_of_month })
    }

    pub fn year(&self) -> i32 {
        self.first_of_month.year()
    }

    pub fn month(&self) -> u32 {
        self.first_of_month.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_of_month
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_of_month
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(self.first_of_month)
    }

    /// The Monday on or before the 1st of the month.
    pub fn grid_start(&self) -> NaiveDate {
        let offset = self.first_of_month.weekday().num_days_from_monday();
        self.first_of_month - Days::new(u64::from(offset))
    }

    /// Whether `date` may be picked while this month is displayed.
    pub fn is_selectable(&self, date: NaiveDate, horizon: &BookingHorizon) -> bool {
        let in_month = date.year() == self.year() && date.month() == self.month();
        in_month && horizon.contains(date)
    }

    /// A month may be shown unless it ends before today or starts at/after the horizon end.
    pub fn is_navigable(&self, horizon: &BookingHorizon) -> bool {
        self.last_day() >= horizon.today && self.first_of_month < horizon.last_day()
    }

    fn shifted(&self, delta: i32) -> Option<Self> {
        let months = Months::new(delta.unsigned_abs());
        let first = if delta >= 0 {
            self.first_of_month.checked_add_months(months)
        } else {
            self.first_of_month.checked_sub_months(months)
        }?;
        Some(Self {
            first_of_month: first,
        })
    }

    pub fn can_navigate(&self, delta: i32, horizon: &BookingHorizon) -> bool {
        self.shifted(delta)
            .map(|target| target.is_navigable(horizon))
            .unwrap_or(false)
    }

    /// Moves by `delta` months. Returns false and stays put when the target is out of range.
    pub fn navigate(&mut self, delta: i32, horizon: &BookingHorizon) -> bool {
        match self.shifted(delta) {
            Some(target) if target.is_navigable(horizon) => {
                *self = target;
                true
            }
            _ => false,
        }
    }

    /// The part of this month inside the horizon, i.e. what availability must be fetched for.
    pub fn visible_window(&self, horizon: &BookingHorizon) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.first_of_month.max(horizon.today);
        let end = self.last_day().min(horizon.last_day());
        (start <= end).then_some((start, end))
    }

    pub fn render(
        &self,
        horizon: &BookingHorizon,
        availability: &DateAvailabilityStore,
        selected: Option<NaiveDate>,
    ) -> MonthGrid {
        let start = self.grid_start();
        let cells = (0..GRID_CELLS as u64)
            .map(|offset| {
                let date = start + Days::new(offset);
                let in_month = date.month() == self.month() && date.year() == self.year();
                CalendarCell {
                    date,
                    in_month,
                    is_today: date == horizon.today,
                    selectable: self.is_selectable(date, horizon),
                    selected: selected == Some(date),
                    availability: if in_month {
                        availability.get(date)
                    } else {
                        DayAvailability::Unknown
                    },
                }
            })
            .collect();

        MonthGrid {
            year: self.year(),
            month: self.month(),
            title: format!("{} {}", MONTH_NAMES[self.month0()], self.year()),
            cells,
            can_go_back: self.can_navigate(-1, horizon),
            can_go_forward: self.can_navigate(1, horizon),
        }
    }

    fn month0(&self) -> usize {
        self.first_of_month.month0() as usize
    }
}
