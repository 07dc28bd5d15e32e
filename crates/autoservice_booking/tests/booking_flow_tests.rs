use autoservice_booking::{
    AvailabilityState, BannerKind, DateError, Field, FormValues, RegionState, SlotError,
    SlotState, SubmitError, SubmitState,
};
use autoservice_common::models::{DayAvailability, SlotAnswer, StatusSource};
use autoservice_common::BackendError;
use chrono::Duration as ChronoDuration;
use fixtures::{create_controller, date, fill_customer, slot, FakeBackend, SubmitBehavior};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;


#[tokio::test]
async fn scenario_a_successful_booking_resets_the_page() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let day = date(2024, 6, 10);
    controller.select_date(day).await.unwrap();
    controller.select_slot(slot("10:00")).unwrap();
    fill_customer(&controller);
    assert!(controller.snapshot().submit_enabled);

    let text = controller.submit().await.unwrap();
    assert!(text.contains("Иван Петров"));
    assert!(text.contains("2024-06-10"));
    assert!(text.contains("10:00"));

    let snapshot = controller.snapshot();
    let banner = snapshot.banner.expect("success banner");
    assert_eq!(banner.kind, BannerKind::Success);
    assert_eq!(banner.text, text);
    assert_eq!(snapshot.values, FormValues::default());
    assert_eq!(snapshot.selected_date, None);
    assert_eq!(snapshot.selected_time, None);
    assert!(matches!(snapshot.submit, SubmitState::Succeeded(_)));
    assert!(!controller.is_slot_cached(day));

    let sent = backend.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone, "79991234567");
    assert_eq!(sent[0].service, "Замена масла");
    assert_eq!(sent[0].car_model, "Toyota Camry");
    assert_eq!(sent[0].time, Some(slot("10:00")));
}

#[tokio::test]
async fn scenario_b_paused_bookings_send_nothing() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    controller.select_date(date(2024, 6, 10)).await.unwrap();
    controller.select_slot(slot("10:00")).unwrap();
    fill_customer(&controller);

    backend.set_status(false, "Запись приостановлена на праздники");
    controller.on_visibility_changed(true).await;

    let snapshot = controller.snapshot();
    assert!(!snapshot.form_enabled);
    assert!(!snapshot.submit_enabled);
    assert_eq!(
        snapshot.status_message.as_deref(),
        Some("Запись приостановлена на праздники")
    );

    let err = controller.submit().await.unwrap_err();
    assert!(
        matches!(err, SubmitError::BookingPaused(ref m) if m == "Запись приостановлена на праздники")
    );
    assert_eq!(FakeBackend::count(&backend.submit_calls), 0);
    let banner = controller.snapshot().banner.expect("pause banner");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.text, "Запись приостановлена на праздники");

    let err = controller.select_date(date(2024, 6, 11)).await.unwrap_err();
    assert!(matches!(err, DateError::Paused(_)));
}

#[tokio::test]
async fn scenario_c_only_reported_slots_are_selectable() {
    let backend = Arc::new(FakeBackend::active());
    let day = date(2024, 6, 10);
    backend.set_slots(day, SlotAnswer::Available(vec![slot("10:00"), slot("10:30")]));
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let view = controller.select_date(day).await.unwrap().unwrap();
    assert_eq!(view.available(), vec![slot("10:00"), slot("10:30")]);
    assert_eq!(
        view.entries
            .iter()
            .filter(|e| e.state == SlotState::Available)
            .count(),
        2
    );
    assert_eq!(view.entries.len(), 22);

    let err = controller.select_slot(slot("11:00")).unwrap_err();
    assert!(matches!(err, SlotError::Occupied(_)));
    assert_eq!(controller.snapshot().selected_time, None);
}

#[tokio::test(start_paused = true)]
async fn scenario_d_timeout_keeps_the_form() {
    let backend = Arc::new(FakeBackend::active());
    backend.script_submits([
        SubmitBehavior::Hang,
        SubmitBehavior::Hang,
        SubmitBehavior::Hang,
    ]);
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    controller.select_date(date(2024, 6, 10)).await.unwrap();
    controller.select_slot(slot("10:00")).unwrap();
    fill_customer(&controller);
    let before = controller.snapshot().values;

    let err = controller.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Backend(BackendError::Timeout(_))));
    assert_eq!(FakeBackend::count(&backend.submit_calls), 3);

    let snapshot = controller.snapshot();
    let banner = snapshot.banner.expect("error banner");
    assert_eq!(banner.kind, BannerKind::Error);
    assert!(snapshot.submit_enabled);
    assert!(matches!(snapshot.submit, SubmitState::Failed(_)));
    assert_eq!(snapshot.values, before);
    assert_eq!(snapshot.selected_date, Some(date(2024, 6, 10)));
    assert_eq!(snapshot.selected_time, Some(slot("10:00")));

    // the error banner goes away on its own
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(controller.tick());
    assert!(controller.snapshot().banner.is_none());
}

#[tokio::test]
async fn loading_the_same_date_twice_hits_the_backend_once() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let day = date(2024, 6, 12);
    controller.select_date(day).await.unwrap();
    controller.select_date(day).await.unwrap();
    assert_eq!(FakeBackend::count(&backend.slot_calls), 1);
}

#[tokio::test]
async fn load_for_date_serves_repeat_calls_from_the_cache() {
    let backend = Arc::new(FakeBackend::active());
    backend.set_slots(
        date(2024, 6, 13),
        SlotAnswer::Available(vec![slot("11:00"), slot("11:30")]),
    );
    let (controller, _clock) = create_controller(backend.clone());

    let first = controller.load_for_date(date(2024, 6, 13)).await.unwrap().unwrap();
    let second = controller.load_for_date(date(2024, 6, 13)).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.available(), vec![slot("11:00"), slot("11:30")]);
    assert_eq!(FakeBackend::count(&backend.slot_calls), 1);
    assert!(controller.is_slot_cached(date(2024, 6, 13)));
}

#[tokio::test]
async fn invalid_form_shows_no_banner() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let err = controller.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Validation { .. }));
    assert!(err.banner_text().is_none());
    assert!(controller.snapshot().banner.is_none());
}

#[tokio::test]
async fn successful_submission_invalidates_the_slot_cache() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let day = date(2024, 6, 10);
    controller.select_date(day).await.unwrap();
    controller.select_slot(slot("10:30")).unwrap();
    fill_customer(&controller);
    controller.submit().await.unwrap();

    controller.select_date(day).await.unwrap();
    assert_eq!(FakeBackend::count(&backend.slot_calls), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_submit_issues_a_single_write() {
    let backend = Arc::new(FakeBackend::active());
    backend.set_submit_delay(Duration::from_secs(1));
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    controller.select_date(date(2024, 6, 10)).await.unwrap();
    controller.select_slot(slot("10:00")).unwrap();
    fill_customer(&controller);

    let (first, second) = tokio::join!(controller.submit(), controller.submit());
    assert!(first.is_ok());
    assert!(matches!(second, Err(SubmitError::AlreadyInFlight)));
    assert_eq!(FakeBackend::count(&backend.submit_calls), 1);
}

#[tokio::test(start_paused = true)]
async fn server_errors_are_retried_with_the_same_request_id() {
    let backend = Arc::new(FakeBackend::active());
    backend.script_submits([SubmitBehavior::ServerError, SubmitBehavior::Accept]);
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    controller.select_date(date(2024, 6, 10)).await.unwrap();
    controller.select_slot(slot("10:00")).unwrap();
    fill_customer(&controller);
    controller.submit().await.unwrap();

    let sent = backend.submitted();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].request_id, sent[1].request_id);
}

#[tokio::test]
async fn backend_rejection_is_shown_verbatim_and_not_retried() {
    let backend = Arc::new(FakeBackend::active());
    backend.script_submits([SubmitBehavior::Reject("Это время уже занято".into())]);
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    controller.select_date(date(2024, 6, 10)).await.unwrap();
    controller.select_slot(slot("10:00")).unwrap();
    fill_customer(&controller);
    controller.submit().await.unwrap_err();

    assert_eq!(FakeBackend::count(&backend.submit_calls), 1);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.banner.unwrap().text, "Это время уже занято");
    assert_eq!(snapshot.values.name, "Иван Петров");
}

#[tokio::test]
async fn invalid_form_is_not_sent() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    controller.set_field(Field::Name, "Иван Петров");
    controller.set_field(Field::Phone, "+7 999 123");

    match controller.submit().await {
        Err(SubmitError::Validation {
            first_invalid,
            errors,
        }) => {
            assert_eq!(first_invalid, Field::Phone);
            assert!(errors.contains_key(&Field::Date));
            assert!(errors.contains_key(&Field::Time));
            assert!(errors.contains_key(&Field::Agree));
            assert!(!errors.contains_key(&Field::Name));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert_eq!(FakeBackend::count(&backend.submit_calls), 0);
    assert!(controller.snapshot().errors.contains_key(&Field::Phone));
}

#[tokio::test]
async fn selecting_a_date_and_slot_clears_their_errors() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;
    controller.submit().await.unwrap_err();
    assert!(controller.snapshot().errors.contains_key(&Field::Date));

    controller.select_date(date(2024, 6, 10)).await.unwrap();
    controller.select_slot(slot("10:00")).unwrap();
    let errors = controller.snapshot().errors;
    assert!(!errors.contains_key(&Field::Date));
    assert!(!errors.contains_key(&Field::Time));
}

#[tokio::test]
async fn date_that_slipped_into_the_past_is_rejected_at_submit() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, clock) = create_controller(backend.clone());
    controller.start().await;

    controller.select_date(date(2024, 6, 5)).await.unwrap();
    controller.select_slot(slot("10:30")).unwrap();
    fill_customer(&controller);
    clock.advance(ChronoDuration::days(1));

    let err = controller.submit().await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Validation {
            first_invalid: Field::Date,
            ..
        }
    ));
    assert_eq!(FakeBackend::count(&backend.submit_calls), 0);
}

#[tokio::test]
async fn dates_outside_the_horizon_cannot_be_selected() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let err = controller.select_date(date(2024, 6, 4)).await.unwrap_err();
    assert!(matches!(err, DateError::NotSelectable(_)));
    assert_eq!(FakeBackend::count(&backend.slot_calls), 0);
}

#[tokio::test]
async fn slot_failure_shows_an_error_and_invents_nothing() {
    let backend = Arc::new(FakeBackend::active());
    backend.fail_slots(true);
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let err = controller.select_date(date(2024, 6, 10)).await.unwrap_err();
    assert!(matches!(err, DateError::Backend(_)));
    let snapshot = controller.snapshot();
    assert!(matches!(snapshot.slots, RegionState::Error(_)));
    assert!(!controller.is_slot_cached(date(2024, 6, 10)));

    backend.fail_slots(false);
    controller.select_date(date(2024, 6, 10)).await.unwrap();
    assert_eq!(FakeBackend::count(&backend.slot_calls), 2);
}

#[tokio::test]
async fn unreachable_status_fails_closed() {
    let backend = Arc::new(FakeBackend::active());
    backend.break_status();
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;

    let snapshot = controller.snapshot();
    assert!(!snapshot.form_enabled);
    assert_eq!(snapshot.status.unwrap().source, StatusSource::Fallback);
    assert_eq!(
        snapshot.status_message.as_deref(),
        Some("Не удалось проверить доступность записи. Попробуйте позже.")
    );
}

#[tokio::test]
async fn failed_availability_marks_the_calendar_degraded() {
    let backend = Arc::new(FakeBackend::active());
    backend.set_availability(BTreeMap::from([(
        date(2024, 6, 10),
        DayAvailability::Open(3),
    )]));
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;
    let month = controller.render_month();
    assert_eq!(
        month.cell(date(2024, 6, 10)).unwrap().availability,
        DayAvailability::Open(3)
    );

    backend.break_availability();
    controller.refresh_availability().await;
    let snapshot = controller.snapshot();
    assert!(matches!(
        snapshot.availability,
        AvailabilityState::Degraded { .. }
    ));
    let cell = snapshot.month.cell(date(2024, 6, 10)).unwrap();
    assert_eq!(cell.availability, DayAvailability::Unknown);
    assert!(cell.selectable);
}

#[tokio::test]
async fn navigation_fetches_the_next_window() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;
    assert_eq!(FakeBackend::count(&backend.availability_calls), 1);

    assert!(controller.navigate(1).await);
    assert_eq!(controller.render_month().month, 7);
    assert_eq!(FakeBackend::count(&backend.availability_calls), 2);

    assert!(!controller.navigate(1).await);
    assert_eq!(FakeBackend::count(&backend.availability_calls), 2);
}

#[tokio::test]
async fn status_change_drops_cached_slots() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;
    controller.select_date(date(2024, 6, 10)).await.unwrap();
    assert!(controller.is_slot_cached(date(2024, 6, 10)));

    backend.set_status(false, "Пауза");
    assert!(controller.refresh_status().await);
    assert!(!controller.is_slot_cached(date(2024, 6, 10)));
}

#[tokio::test]
async fn new_status_message_drops_cached_slots_and_availability() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    controller.start().await;
    controller.select_date(date(2024, 6, 10)).await.unwrap();
    assert_eq!(FakeBackend::count(&backend.availability_calls), 1);

    backend.set_status(true, "С 1 июля новые цены на диагностику");
    assert!(controller.refresh_status().await);
    assert!(!controller.is_slot_cached(date(2024, 6, 10)));
    assert_eq!(FakeBackend::count(&backend.availability_calls), 2);

    assert!(!controller.refresh_status().await);
    assert_eq!(FakeBackend::count(&backend.availability_calls), 2);
}

#[tokio::test(start_paused = true)]
async fn status_is_polled_every_five_minutes() {
    let backend = Arc::new(FakeBackend::active());
    let (controller, _clock) = create_controller(backend.clone());
    let controller = Arc::new(controller);
    controller.start().await;
    let handle = controller.spawn_status_polling();

    tokio::time::sleep(Duration::from_secs(299)).await;
    assert_eq!(FakeBackend::count(&backend.status_calls), 1);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(FakeBackend::count(&backend.status_calls), 2);

    handle.abort();
}
