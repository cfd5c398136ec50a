//! HTTP contract of the scheduler backend, checked against a mock server.

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::America::Vancouver;
use clubsched_core::api::Routes;
use clubsched_core::roles::RolesUpdate;
use clubsched_core::{
    AdminView, ApiClient, ApiError, EventKind, RoleFilter, ScheduleSession, SessionError,
    Selection, Severity, SyncState,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Routes::default(), Duration::from_secs(5)).unwrap()
}

fn monday(from: u32, to: u32) -> Selection {
    let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    Selection::from_local(
        date,
        NaiveTime::from_hms_opt(from, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(to, 0, 0).unwrap(),
        &Vancouver,
    )
    .unwrap()
}

#[tokio::test]
async fn load_reads_wrapped_schedule_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedule/"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schedule": [
                { "id": "r1", "type": "Recurring", "dayOfWeek": 1,
                  "startTime": "09:00:00", "endTime": "10:00:00" },
                { "id": "o1", "type": "OneOff",
                  "start": "2025-06-05T11:00:00-07:00", "end": "2025-06-05T12:00:00-07:00" },
                { "id": "bad" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = ScheduleSession::new(client(&server), Vancouver, Some("tok-1".into()));
    let warnings = session.load().await.unwrap();

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].index, 2);
    let kinds: Vec<_> = session.events().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EventKind::Recurring, EventKind::OneOff]);
    assert_eq!(session.state(), SyncState::Clean);
}

#[tokio::test]
async fn save_posts_the_full_set() {
    let server = MockServer::start().await;
    let session = ScheduleSession::new(client(&server), Vancouver, Some("tok-1".into()));
    let event = session
        .add_selection(&monday(9, 10), EventKind::Recurring)
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/schedule/"))
        .and(header("Authorization", "Bearer tok-1"))
        .and(body_json(json!([{
            "id": event.id.as_str(),
            "type": "Recurring",
            "title": "Recurring",
            "color": "green",
            "dayOfWeek": 1,
            "startTime": "09:00:00",
            "endTime": "10:00:00"
        }])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Schedule updated" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    session.save().await.unwrap();

    assert_eq!(session.events(), vec![event]);
    assert_eq!(session.state(), SyncState::Clean);
}

#[tokio::test]
async fn reset_posts_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/schedule/"))
        .and(body_json(json!([])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = ScheduleSession::new(client(&server), Vancouver, Some("tok-1".into()));
    session
        .add_selection(&monday(9, 10), EventKind::OneOff)
        .unwrap();

    session.reset().await.unwrap();
    assert!(session.events().is_empty());
}

#[tokio::test]
async fn server_failure_keeps_local_edits_and_passes_detail_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/schedule/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "database unavailable" })),
        )
        .mount(&server)
        .await;

    let session = ScheduleSession::new(client(&server), Vancouver, Some("tok-1".into()));
    session
        .add_selection(&monday(9, 10), EventKind::Recurring)
        .unwrap();
    let before = session.events();

    let err = session.save().await.unwrap_err();

    assert!(matches!(
        &err,
        SessionError::Api(ApiError::Server { status: 500, detail }) if detail == "database unavailable"
    ));
    assert_eq!(session.events(), before);
    assert_eq!(
        session.state(),
        SyncState::Error("database unavailable".into())
    );
}

#[tokio::test]
async fn expired_token_is_an_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid token" })),
        )
        .mount(&server)
        .await;

    let session = ScheduleSession::new(client(&server), Vancouver, Some("old".into()));
    match session.load().await {
        Err(SessionError::Api(e)) => assert!(e.is_auth_failure()),
        other => panic!("expected an auth failure, got {other:?}"),
    }
}

#[tokio::test]
async fn admin_role_filter_is_sent_and_reapplied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .and(query_param("role", "Media"))
        .and(header("Authorization", "Bearer admin-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "startDate": "2025-06-02T09:00:00-07:00", "endDate": "2025-06-02T10:00:00-07:00",
              "numberOfPeople": 3, "maxPeopleAvailable": 4, "role": "Media" },
            { "startDate": "2025-06-02T10:00:00-07:00", "endDate": "2025-06-02T11:00:00-07:00",
              "numberOfPeople": 1, "maxPeopleAvailable": 4, "role": "Events" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = AdminView::new(Some("admin-tok".into()), RoleFilter::parse("Media"));
    assert!(view.refresh(&client(&server)).await.unwrap());

    let entries = view.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "3/4");
    assert_eq!(entries[0].severity, Severity::Good);
    assert!(!view.needs_refresh());
}

#[tokio::test]
async fn admin_all_roles_sends_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = AdminView::new(Some("admin-tok".into()), RoleFilter::All);
    view.refresh(&client(&server)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn roles_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/roles/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "me@example.com", "roles": ["Volunteer"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/roles/"))
        .and(body_json(json!({ "roles": ["Admin", "Media"], "password": "letmein" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "roles": ["Admin", "Media"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    assert_eq!(api.roles("tok").await.unwrap().roles, vec!["Volunteer"]);

    let update = RolesUpdate::new(
        vec!["Admin".into(), "Media".into()],
        Some("letmein".into()),
    )
    .unwrap();
    let updated = api.update_roles("tok", update).await.unwrap();
    assert_eq!(updated.roles, vec!["Admin", "Media"]);
}

#[tokio::test]
async fn wrong_admin_password_detail_is_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/roles/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "Invalid admin password" })),
        )
        .mount(&server)
        .await;

    let update = RolesUpdate::new(vec!["Admin".into()], Some("nope".into())).unwrap();
    let err = client(&server)
        .update_roles("tok", update)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unauthorized: Invalid admin password");
}
