mod common;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{header, method, path, query_param};

use common::at;
use dispatch_cell::*;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn store_for(mock_server: &MockServer, token: Option<&str>) -> SupabaseDispatchStore {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    SupabaseDispatchStore::new(&config, token.map(str::to_string))
}

#[tokio::test]
async fn test_fetch_technicians_queries_online_assigned() {
    let mock_server = MockServer::start().await;
    let with_position = Uuid::new_v4();
    let without_position = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .and(query_param("availability", "eq.online"))
        .and(query_param("kit_status", "eq.assigned"))
        .and(header("apikey", "test-anon-key"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::technician_row(with_position, &["cairo", "giza"], Some((30.05, 31.23))),
            MockSupabaseResponses::technician_row(without_position, &[], None),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server, Some("user-token"));
    let technicians = store.fetch_online_assigned_technicians().await.unwrap();

    assert_eq!(technicians.len(), 2);
    assert_eq!(technicians[0].id, with_position);
    assert_eq!(technicians[0].coverage_areas, vec!["cairo", "giza"]);
    assert_eq!(technicians[0].last_known_position, Some(GeoPoint::new(30.05, 31.23)));
    assert!(technicians[0].is_dispatchable());
    assert_eq!(technicians[1].last_known_position, None);
    assert!(technicians[1].distance_km.is_none());
}

#[tokio::test]
async fn test_fetch_technicians_with_partial_position_and_null_areas() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": id,
            "availability": "online",
            "kit_status": "assigned",
            "coverage_areas": null,
            "last_lat": 30.0,
            "last_lng": null
        }])))
        .mount(&mock_server)
        .await;

    let technicians = store_for(&mock_server, None)
        .fetch_online_assigned_technicians()
        .await
        .unwrap();

    assert!(technicians[0].coverage_areas.is_empty());
    assert!(technicians[0].last_known_position.is_none());
}

#[tokio::test]
async fn test_fetch_active_appointments_filters_by_status() {
    let mock_server = MockServer::start().await;
    let technician_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("technician_id", format!("eq.{}", technician_id)))
        .and(query_param("status", "in.(booked,confirmed,in_progress)"))
        .and(query_param("order", "start_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(technician_id, "booked", at(9, 0), at(10, 0)),
            MockSupabaseResponses::appointment_row(technician_id, "in_progress", at(11, 0), at(12, 0)),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let appointments = store_for(&mock_server, None)
        .fetch_active_appointments(technician_id)
        .await
        .unwrap();

    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0].status, AppointmentStatus::Booked);
    assert_eq!(appointments[1].status, AppointmentStatus::InProgress);
    assert_eq!(appointments[1].start_at, at(11, 0));
}

#[tokio::test]
async fn test_fetch_address_geo() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/addresses"))
        .and(query_param("id", "eq.addr-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::address_row("addr-1", Some(30.0444), Some(31.2357)),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/addresses"))
        .and(query_param("id", "eq.addr-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::address_row("addr-2", None, None),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/addresses"))
        .and(query_param("id", "eq.addr-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = store_for(&mock_server, None);

    assert_eq!(store.fetch_address_geo("addr-1").await.unwrap(), Some(GeoPoint::new(30.0444, 31.2357)));
    assert_eq!(store.fetch_address_geo("addr-2").await.unwrap(), None);
    assert_eq!(store.fetch_address_geo("addr-3").await.unwrap(), None);
}

#[tokio::test]
async fn test_server_error_is_load_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("database unavailable", "XX000"),
        ))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server, None).fetch_online_assigned_technicians().await;
    assert_matches!(result, Err(DispatchError::LoadFailure(_)));
}

#[tokio::test]
async fn test_undecodable_rows_are_load_failure() {
    let mock_server = MockServer::start().await;
    let technician_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "technician_id": technician_id,
            "status": "booked"
        }])))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server, None).fetch_active_appointments(technician_id).await;
    assert_matches!(result, Err(DispatchError::LoadFailure(_)));
}

#[tokio::test]
async fn test_engine_over_supabase_store() {
    let mock_server = MockServer::start().await;
    let busy = Uuid::new_v4();
    let free = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::technician_row(free, &["cairo"], Some((30.10, 31.2357))),
            MockSupabaseResponses::technician_row(busy, &["cairo"], Some((30.05, 31.2357))),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("technician_id", format!("eq.{}", busy)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(busy, "confirmed", at(10, 0), at(11, 0)),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("technician_id", format!("eq.{}", free)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let engine = DispatchEngine::new(std::sync::Arc::new(store_for(&mock_server, None)));
    let request = DispatchRequest::at(at(10, 30))
        .with_area("cairo")
        .with_position(30.0444, 31.2357);

    let result = engine.dispatch(&request).await.unwrap();
    assert_eq!(result.technician().map(|t| t.id), Some(free));
}

#[tokio::test]
async fn test_unrecognised_appointment_status_is_not_a_conflict() {
    let mock_server = MockServer::start().await;
    let technician_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/technicians"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::technician_row(technician_id, &[], None),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(technician_id, "rescheduled", at(10, 0), at(11, 0)),
        ])))
        .mount(&mock_server)
        .await;

    let store = std::sync::Arc::new(store_for(&mock_server, None));

    let appointments = store.fetch_active_appointments(technician_id).await.unwrap();
    assert_eq!(appointments[0].status, AppointmentStatus::Unknown);

    let result = DispatchEngine::new(store).dispatch(&DispatchRequest::at(at(10, 30))).await.unwrap();
    assert_eq!(result.technician().map(|t| t.id), Some(technician_id));
}
