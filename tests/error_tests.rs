// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::response::IntoResponse;
use firecache::error::OfflineError;
use http::StatusCode;
use http_body_util::BodyExt;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        OfflineError::Network("connection refused".to_string()),
        OfflineError::Cache("quota exceeded".to_string()),
        OfflineError::Install("/missing.css answered 404".to_string()),
        OfflineError::SyncRegistration("no scheduler".to_string()),
        OfflineError::NotActive,
        OfflineError::NotificationNotFound("abc".to_string()),
        OfflineError::InvalidRequest("Bad request".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_install_error_names_failing_resource() {
    let error = OfflineError::Install("/missing.css answered 404".to_string());
    assert!(format!("{}", error).contains("/missing.css"));
}

#[test]
fn test_url_error_converts() {
    let error: OfflineError = url::Url::parse("not a url").unwrap_err().into();
    assert!(matches!(error, OfflineError::Url(_)));
}

#[test]
fn test_is_network() {
    assert!(OfflineError::Network("down".to_string()).is_network());
    assert!(!OfflineError::Cache("full".to_string()).is_network());
    assert!(!OfflineError::NotActive.is_network());
}

async fn render(error: OfflineError) -> (StatusCode, serde_json::Value) {
    let response = error.into_response();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_network_error_renders_bad_gateway() {
    let (status, body) = render(OfflineError::Network("connection refused".to_string())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "network_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = vec![
        (OfflineError::InvalidRequest("x".to_string()), StatusCode::BAD_REQUEST),
        (OfflineError::NotificationNotFound("x".to_string()), StatusCode::NOT_FOUND),
        (OfflineError::NotActive, StatusCode::SERVICE_UNAVAILABLE),
        (OfflineError::Install("x".to_string()), StatusCode::SERVICE_UNAVAILABLE),
        (OfflineError::Config("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        (OfflineError::Internal("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected) in cases {
        let (status, _) = render(error).await;
        assert_eq!(status, expected);
    }
}
