use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agenda_cell::router::{provider_routes, schedule_routes, service_routes};
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockPostgrestResponses, TestConfig, TestUser};

/// Builds the cell's routes the way the API composes them.
async fn create_test_app(config: AppConfig) -> Router {
    let state = Arc::new(config);
    Router::new()
        .nest("/schedules", schedule_routes(state.clone()))
        .nest("/providers", provider_routes(state.clone()))
        .nest("/services", service_routes(state))
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Mounts the reads the availability resolver performs for one
/// provider/service pair. Appointments are left to each test.
async fn mount_agenda_reads(
    mock_server: &MockServer,
    organization_id: &str,
    schedule_id: &str,
    provider_id: &str,
    service_id: &str,
    duration_minutes: i32,
) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .and(query_param("id", format!("eq.{}", schedule_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::schedule_response(schedule_id, organization_id, "UTC")
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .and(query_param("id", format!("eq.{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::provider_response(
                provider_id,
                organization_id,
                schedule_id,
                "Dana Reyes"
            )
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("id", format!("eq.{}", service_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::service_response(
                service_id,
                organization_id,
                "Intro call",
                duration_minutes
            )
        ])))
        .mount(mock_server)
        .await;

    // Monday mornings, 08:00 to 12:00
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .and(query_param("provider_id", format!("eq.{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::window_response(
                provider_id,
                organization_id,
                1,
                "08:00:00",
                "12:00:00"
            )
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_exceptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_availability_returns_ordered_slots() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let schedule_id = Uuid::new_v4().to_string();
    let provider_id = Uuid::new_v4().to_string();
    let service_id = Uuid::new_v4().to_string();

    mount_agenda_reads(
        &mock_server,
        &user.organization_id,
        &schedule_id,
        &provider_id,
        &service_id,
        30,
    )
    .await;

    // Only non-terminal appointments block slots, and the day is empty
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(scheduled,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!(
            "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-04&to=2027-01-04",
            schedule_id, provider_id, service_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["total"], 8);

    let availability = &json_response["availability"];
    assert_eq!(availability["provider_id"].as_str().unwrap(), provider_id);
    assert_eq!(availability["duration_minutes"], 30);
    assert_eq!(availability["timezone"], "UTC");

    let slots = availability["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 8);
    assert_eq!(slots[0]["date"], "2027-01-04");
    assert_eq!(slots[0]["start_time"], "08:00:00");
    assert_eq!(slots[0]["end_time"], "08:30:00");
    assert_eq!(slots[7]["start_time"], "11:30:00");

    let starts: Vec<&str> = slots
        .iter()
        .map(|slot| slot["start_time"].as_str().unwrap())
        .collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[tokio::test]
async fn test_availability_skips_booked_slots() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let schedule_id = Uuid::new_v4().to_string();
    let provider_id = Uuid::new_v4().to_string();
    let service_id = Uuid::new_v4().to_string();

    mount_agenda_reads(
        &mock_server,
        &user.organization_id,
        &schedule_id,
        &provider_id,
        &service_id,
        30,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(scheduled,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::appointment_response(
                &user.organization_id,
                &provider_id,
                "2027-01-04",
                "08:30:00",
                "09:00:00",
                "scheduled"
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!(
            "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-04&to=2027-01-04",
            schedule_id, provider_id, service_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["total"], 7);

    let slots = json_response["availability"]["slots"].as_array().unwrap();
    assert!(slots.iter().all(|slot| slot["start_time"] != "08:30:00"));
    assert!(slots.iter().any(|slot| slot["start_time"] == "08:00:00"));
    assert!(slots.iter().any(|slot| slot["start_time"] == "09:00:00"));
}

#[tokio::test]
async fn test_availability_is_deterministic() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let schedule_id = Uuid::new_v4().to_string();
    let provider_id = Uuid::new_v4().to_string();
    let service_id = Uuid::new_v4().to_string();

    mount_agenda_reads(
        &mock_server,
        &user.organization_id,
        &schedule_id,
        &provider_id,
        &service_id,
        30,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;
    let uri = format!(
        "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-04&to=2027-01-10",
        schedule_id, provider_id, service_id
    );

    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let second = app
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let first_json = response_json(first).await;
    let second_json = response_json(second).await;
    assert_eq!(first_json, second_json);
    // One Monday inside the week-long range
    assert_eq!(first_json["total"], 8);
}

#[tokio::test]
async fn test_whole_day_exception_blanks_the_date() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let schedule_id = Uuid::new_v4().to_string();
    let provider_id = Uuid::new_v4().to_string();
    let service_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::schedule_response(&schedule_id, &user.organization_id, "UTC")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::provider_response(
                &provider_id,
                &user.organization_id,
                &schedule_id,
                "Dana Reyes"
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::service_response(
                &service_id,
                &user.organization_id,
                "Intro call",
                30
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::window_response(
                &provider_id,
                &user.organization_id,
                1,
                "08:00:00",
                "12:00:00"
            )
        ])))
        .mount(&mock_server)
        .await;

    // Provider is out for the whole Monday
    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_exceptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::exception_response(
                &user.organization_id,
                Some(&provider_id),
                None,
                "2027-01-04",
                None,
                None
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!(
            "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-04&to=2027-01-04",
            schedule_id, provider_id, service_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["total"], 0);
    assert!(json_response["availability"]["slots"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_availability_rejects_inverted_range() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!(
            "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-05&to=2027-01-04",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json_response = response_json(response).await;
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("'from' date must be on or before"));
}

#[tokio::test]
async fn test_availability_rejects_oversized_range() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!(
            "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-01&to=2027-03-01",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json_response = response_json(response).await;
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("exceeds the 31 day limit"));
}

#[tokio::test]
async fn test_availability_404_when_provider_not_on_schedule() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let schedule_id = Uuid::new_v4().to_string();
    let provider_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::schedule_response(&schedule_id, &user.organization_id, "UTC")
        ])))
        .mount(&mock_server)
        .await;

    // Provider belongs to some other schedule
    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::provider_response(
                &provider_id,
                &user.organization_id,
                &Uuid::new_v4().to_string(),
                "Dana Reyes"
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!(
            "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-04&to=2027-01-04",
            schedule_id,
            provider_id,
            Uuid::new_v4()
        ))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json_response = response_json(response).await;
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("Provider is not part of this schedule"));
}

#[tokio::test]
async fn test_disabled_schedule_returns_no_slots() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("booker@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let schedule_id = Uuid::new_v4().to_string();
    let provider_id = Uuid::new_v4().to_string();
    let service_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": schedule_id,
            "organization_id": user.organization_id,
            "name": "Main agenda",
            "color": "#4f46e5",
            "timezone": "UTC",
            "is_active": false,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::provider_response(
                &provider_id,
                &user.organization_id,
                &schedule_id,
                "Dana Reyes"
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::service_response(
                &service_id,
                &user.organization_id,
                "Intro call",
                30
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!(
            "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-04&to=2027-01-04",
            schedule_id, provider_id, service_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["total"], 0);
}

#[tokio::test]
async fn test_admin_creates_schedule() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let schedule_id = Uuid::new_v4().to_string();
    Mock::given(method("POST"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockPostgrestResponses::schedule_response(&schedule_id, &user.organization_id, "UTC")
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("POST")
        .uri("/schedules")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "name": "Main agenda" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["name"], "Main agenda");
    assert_eq!(json_response["is_active"], true);
}

#[tokio::test]
async fn test_schedule_management_requires_admin_role() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("agent@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("POST")
        .uri("/schedules")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "name": "Main agenda" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json_response = response_json(response).await;
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("administrators"));
}

#[tokio::test]
async fn test_create_window_validates_day_and_times() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let app = create_test_app(config).await;
    let provider_id = Uuid::new_v4();

    let bad_day = Request::builder()
        .method("POST")
        .uri(format!("/providers/{}/windows", provider_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "day_of_week": 7,
                "start_time": "08:00:00",
                "end_time": "12:00:00"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(bad_day).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_response = response_json(response).await;
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("Day of week"));

    let inverted = Request::builder()
        .method("POST")
        .uri(format!("/providers/{}/windows", provider_id))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "day_of_week": 1,
                "start_time": "12:00:00",
                "end_time": "12:00:00"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(inverted).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json_response = response_json(response).await;
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("Start time must be before end time"));
}

#[tokio::test]
async fn test_partial_exception_requires_both_bounds() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/providers/{}/exceptions", Uuid::new_v4()))
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "date": "2027-01-04",
                "start_time": "10:00:00"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json_response = response_json(response).await;
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("Partial-day exceptions require both start and end times"));
}

#[tokio::test]
async fn test_list_windows_returns_rows() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("agent@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let provider_id = Uuid::new_v4().to_string();
    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .and(query_param("id", format!("eq.{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::provider_response(
                &provider_id,
                &user.organization_id,
                &Uuid::new_v4().to_string(),
                "Dana Reyes"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_windows"))
        .and(query_param("provider_id", format!("eq.{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::window_response(
                &provider_id,
                &user.organization_id,
                1,
                "08:00:00",
                "12:00:00"
            ),
            MockPostgrestResponses::window_response(
                &provider_id,
                &user.organization_id,
                2,
                "09:00:00",
                "17:00:00"
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;

    let request = Request::builder()
        .uri(format!("/providers/{}/windows", provider_id))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = response_json(response).await;
    assert_eq!(json_response["total"], 2);
    assert_eq!(json_response["windows"][0]["day_of_week"], 1);
}

#[tokio::test]
async fn test_unauthorized_requests_are_rejected() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let app = create_test_app(config).await;

    let endpoints = vec![
        ("GET", "/schedules".to_string()),
        ("POST", "/schedules".to_string()),
        (
            "GET",
            format!(
                "/schedules/{}/availability?provider_id={}&service_id={}&from=2027-01-04&to=2027-01-04",
                Uuid::new_v4(),
                Uuid::new_v4(),
                Uuid::new_v4()
            ),
        ),
        ("POST", format!("/providers/{}/windows", Uuid::new_v4())),
        ("GET", "/services".to_string()),
    ];

    for (method_name, uri) in endpoints {
        let request = Request::builder()
            .method(method_name)
            .uri(&uri)
            .header("Content-Type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {} {}",
            method_name,
            uri
        );
    }
}

#[tokio::test]
async fn test_invalid_tokens_are_rejected() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();

    let user = TestUser::agent("agent@example.com");
    let bad_tokens = vec![
        JwtTestUtils::create_malformed_token(),
        JwtTestUtils::create_invalid_signature_token(&user),
        JwtTestUtils::create_expired_token(&user, &config.supabase_jwt_secret),
    ];

    let app = create_test_app(config).await;

    for token in bad_tokens {
        let request = Request::builder()
            .uri("/schedules")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
