// --- File: crates/autoservice_booking/src/service_test.rs ---
#[cfg(test)]
mod tests {
    use crate::service::{parse_envelope, SheetsBackend};
    use crate::submission::{send_with_retry, SubmitPolicy};
    use autoservice_common::models::{
        BookingRequest, DayAvailability, SlotAnswer, StatusSource, TimeSlot,
    };
    use autoservice_common::{BackendError, BookingBackend};
    use autoservice_config::models::AppConfig;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::{json, Value};
    use std::time::Duration;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> SheetsBackend {
        let config = AppConfig::with_backend_url(format!("{}/exec", server.uri()));
        SheetsBackend::new(&config.backend).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn sample_request() -> BookingRequest {
        BookingRequest {
            name: "Иван Петров".into(),
            phone: "79991234567".into(),
            date: date(10),
            time: TimeSlot::from_hm(10, 0),
            service: "Замена масла".into(),
            car_model: "Toyota Camry".into(),
            comments: String::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap(),
            request_id: Uuid::nil(),
        }
    }

    #[test]
    fn envelope_without_result_is_a_parse_error() {
        let err = parse_envelope::<Value>(r#"{"isActive": true}"#).unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
        let err = parse_envelope::<Value>(r#"{"result": "maybe"}"#).unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
        let err = parse_envelope::<Value>("<html>").unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn error_envelope_carries_backend_message() {
        let err =
            parse_envelope::<Value>(r#"{"result": "error", "message": "Слот занят"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Слот занят");
    }

    #[tokio::test]
    async fn booking_status_is_read_from_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exec"))
            .and(query_param("action", "getBookingStatus"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "isActive": false,
                "message": "Запись закрыта до понедельника"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = backend_for(&server).booking_status().await.unwrap();
        assert!(!status.is_active);
        assert_eq!(status.message, "Запись закрыта до понедельника");
        assert_eq!(status.source, StatusSource::Backend);
    }

    #[tokio::test]
    async fn available_slots_are_returned_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getAvailableSlots"))
            .and(query_param("date", "2024-06-10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "availableSlots": ["10:00", "10:30"]
            })))
            .mount(&server)
            .await;

        let answer = backend_for(&server).available_slots(date(10)).await.unwrap();
        assert_eq!(
            answer,
            SlotAnswer::Available(vec![
                TimeSlot::from_hm(10, 0).unwrap(),
                TimeSlot::from_hm(10, 30).unwrap()
            ])
        );
    }

    #[tokio::test]
    async fn slot_answer_without_known_field_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "result": "success" })),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server).available_slots(date(10)).await.unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[tokio::test]
    async fn date_availability_maps_counts_and_days_off() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getDateAvailability"))
            .and(query_param("startDate", "2024-06-05"))
            .and(query_param("endDate", "2024-06-30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "dateAvailability": { "2024-06-10": 4, "2024-06-09": false }
            })))
            .mount(&server)
            .await;

        let days = backend_for(&server)
            .date_availability(date(5), date(30))
            .await
            .unwrap();
        assert_eq!(days.get(&date(10)), Some(&DayAvailability::Open(4)));
        assert_eq!(days.get(&date(9)), Some(&DayAvailability::DayOff));
    }

    #[tokio::test]
    async fn new_booking_is_posted_as_plain_text_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exec"))
            .and(header("content-type", "text/plain;charset=utf-8"))
            .and(body_partial_json(json!({
                "action": "newBooking",
                "name": "Иван Петров",
                "phone": "79991234567",
                "date": "2024-06-10",
                "time": "10:00",
                "carModel": "Toyota Camry",
                "requestId": "00000000-0000-0000-0000-000000000000"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "message": "Запись создана"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = backend_for(&server)
            .submit_booking(&sample_request())
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("Запись создана"));
    }

    #[tokio::test]
    async fn rejected_booking_surfaces_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "error",
                "message": "Это время уже занято"
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .submit_booking(&sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected(ref m) if m == "Это время уже занято"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .submit_booking(&sample_request())
            .await
            .unwrap_err();
        match err {
            BackendError::Status { status_code, ref body } => {
                assert_eq!(status_code, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stalled_backend_is_reported_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": "success" }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = AppConfig::with_backend_url(format!("{}/exec", server.uri()));
        config.backend.request_timeout_secs = 1;
        let err = SheetsBackend::new(&config.backend)
            .unwrap()
            .submit_booking(&sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout(after) if after == Duration::from_secs(1)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn submission_bound_fires_before_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": "success" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let policy = SubmitPolicy {
            timeout: Duration::from_millis(300),
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        };
        let err = send_with_retry(&backend_for(&server), &sample_request(), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout(after) if after == policy.timeout));
        assert_eq!(
            err.user_message(),
            "Сервер не ответил вовремя. Проверьте соединение и попробуйте ещё раз."
        );
    }

    #[tokio::test]
    async fn toggle_and_recent_bookings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "action": "toggleBooking", "status": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "message": "Запись приостановлена"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("action", "getRecentBookings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "bookings": [
                    { "date": "2024-06-10", "time": "10:00", "name": "Иван Петров" },
                    { "phone": 79990000000u64 }
                ]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert_eq!(
            backend.toggle_booking(false).await.unwrap().as_deref(),
            Some("Запись приостановлена")
        );
        let bookings = backend.recent_bookings().await.unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].name.as_deref(), Some("Иван Петров"));
        assert_eq!(bookings[1].phone.as_deref(), Some("79990000000"));
    }

    #[test]
    fn invalid_url_is_rejected_up_front() {
        let config = AppConfig::with_backend_url("not a url");
        assert!(matches!(
            SheetsBackend::new(&config.backend),
            Err(BackendError::InvalidUrl(_))
        ));
    }
}
