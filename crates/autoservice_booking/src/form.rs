// --- File: crates/autoservice_booking/src/form.rs ---
//! Customer form fields, their validation rules and the phone input mask.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::calendar::BookingHorizon;
use autoservice_common::models::{BookingRequest, TimeSlot};

pub const PHONE_DIGITS: usize = 11;

/// Form inputs in page order; the first invalid one is where the page scrolls to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Phone,
    Date,
    Time,
    Service,
    CarModel,
    Comments,
    Agree,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::Phone,
        Field::Date,
        Field::Time,
        Field::Service,
        Field::CarModel,
        Field::Comments,
        Field::Agree,
    ];
}

/// Raw values as the customer entered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub name: String,
    pub phone: String,
    pub service: String,
    pub car_model: String,
    pub comments: String,
    pub agree: bool,
}

/// Date and time picked through the calendar and the slot list.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext {
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
    pub horizon: BookingHorizon,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_invalid(&self) -> Option<Field> {
        self.errors.keys().next().copied()
    }
}

/// Reduces a phone number to its digits. `None` unless exactly 11 digits remain and
/// the first is 7 or a domestic 8, which is rewritten to 7.
pub fn normalize_phone(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != PHONE_DIGITS {
        return None;
    }
    if let Some(rest) = digits.strip_prefix('8') {
        return Some(format!("7{rest}"));
    }
    digits.starts_with('7').then_some(digits)
}

/// Applies the `+7 (XXX) XXX-XX-XX` mask to whatever has been typed so far.
pub fn format_phone_input(input: &str) -> String {
    let mut digits: Vec<char> = input.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.first().copied() {
        None => return String::new(),
        Some('7') => {}
        Some('8') => digits[0] = '7',
        Some(_) => digits.insert(0, '7'),
    }
    digits.truncate(PHONE_DIGITS);

    let mut out = String::from("+7");
    for (i, digit) in digits.iter().enumerate().skip(1) {
        match i {
            1 => out.push_str(" ("),
            4 => out.push_str(") "),
            7 | 9 => out.push('-'),
            _ => {}
        }
        out.push(*digit);
    }
    out
}

/// The booking form: values, the service list and the error messages currently shown.
#[derive(Debug, Clone)]
pub struct BookingForm {
    values: FormValues,
    services: Vec<String>,
    collect_time: bool,
    errors: BTreeMap<Field, String>,
}

impl BookingForm {
    pub fn new(services: Vec<String>, collect_time: bool) -> Self {
        Self {
            values: FormValues::default(),
            services,
            collect_time,
            errors: BTreeMap::new(),
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn collects_time(&self) -> bool {
        self.collect_time
    }

    /// Stores a text value verbatim. Returns false for inputs that are not typed in.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> bool {
        let slot = match field {
            Field::Name => &mut self.values.name,
            Field::Phone => &mut self.values.phone,
            Field::Service => &mut self.values.service,
            Field::CarModel => &mut self.values.car_model,
            Field::Comments => &mut self.values.comments,
            Field::Date | Field::Time | Field::Agree => return false,
        };
        *slot = value.into();
        true
    }

    /// Phone keystrokes go through the input mask.
    pub fn type_phone(&mut self, input: &str) {
        self.values.phone = format_phone_input(input);
    }

    pub fn set_agree(&mut self, agree: bool) {
        self.values.agree = agree;
        if agree {
            self.errors.remove(&Field::Agree);
        }
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn clear_error(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    fn check(&self, field: Field, ctx: &SelectionContext) -> Result<(), &'static str> {
        let v = &self.values;
        match field {
            Field::Name if v.name.trim().is_empty() => Err("Пожалуйста, введите ваше имя"),
            Field::Phone if normalize_phone(&v.phone).is_none() => {
                Err("Введите корректный номер телефона: 11 цифр")
            }
            Field::Service if !self.is_known_service(&v.service) => {
                Err("Пожалуйста, выберите услугу")
            }
            Field::CarModel if v.car_model.trim().is_empty() => {
                Err("Пожалуйста, укажите марку и модель автомобиля")
            }
            Field::Agree if !v.agree => Err("Необходимо согласие на обработку персональных данных"),
            Field::Date => match ctx.date {
                None => Err("Пожалуйста, выберите дату"),
                Some(date) if !ctx.horizon.contains(date) => {
                    Err("Выбранная дата недоступна. Пожалуйста, выберите другую дату")
                }
                Some(_) => Ok(()),
            },
            Field::Time if self.collect_time && ctx.time.is_none() => {
                Err("Пожалуйста, выберите время")
            }
            _ => Ok(()),
        }
    }

    fn is_known_service(&self, service: &str) -> bool {
        let service = service.trim();
        !service.is_empty() && (self.services.is_empty() || self.services.iter().any(|s| s == service))
    }

    /// Re-checks one field and shows or hides its message. Returns whether it is valid.
    pub fn validate_field(&mut self, field: Field, ctx: &SelectionContext) -> bool {
        match self.check(field, ctx) {
            Ok(()) => {
                self.errors.remove(&field);
                true
            }
            Err(message) => {
                self.errors.insert(field, message.to_string());
                false
            }
        }
    }

    /// Checks every field and makes every failing message visible.
    pub fn validate_form(&mut self, ctx: &SelectionContext) -> ValidationReport {
        let report = self.report(ctx);
        self.errors = report.errors.clone();
        report
    }

    fn report(&self, ctx: &SelectionContext) -> ValidationReport {
        let errors = Field::ALL
            .iter()
            .filter_map(|field| {
                self.check(*field, ctx)
                    .err()
                    .map(|message| (*field, message.to_string()))
            })
            .collect();
        ValidationReport { errors }
    }

    /// Assembles the payload. Fails with the validation report if anything is missing.
    pub fn to_request(
        &self,
        ctx: &SelectionContext,
        timestamp: DateTime<Utc>,
        request_id: Uuid,
    ) -> Result<BookingRequest, ValidationReport> {
        let report = self.report(ctx);
        let (Some(date), Some(phone)) = (ctx.date, normalize_phone(&self.values.phone)) else {
            return Err(report);
        };
        if !report.is_valid() {
            return Err(report);
        }
        Ok(BookingRequest {
            name: self.values.name.trim().to_string(),
            phone,
            date,
            time: if self.collect_time { ctx.time } else { None },
            service: self.values.service.trim().to_string(),
            car_model: self.values.car_model.trim().to_string(),
            comments: self.values.comments.trim().to_string(),
            timestamp,
            request_id,
        })
    }

    /// Clears every value and message; the service list stays.
    pub fn reset(&mut self) {
        self.values = FormValues::default();
        self.errors.clear();
    }
}
