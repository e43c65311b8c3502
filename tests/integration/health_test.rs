//! Integration tests for the health endpoint.

mod helpers;

use http::StatusCode;

#[tokio::test]
async fn test_health_without_database() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["database"], "disabled");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = helpers::TestApp::new();
    let response = app.request("GET", "/api/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
