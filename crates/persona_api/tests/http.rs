use persona_api::{ApiClient, ApiConfig, ApiError};

fn config() -> ApiConfig {
    ApiConfig::new(
        "https://assistant.example/api/v1/prediction",
        "https://images.example/api/generate",
    )
}

#[test]
fn client_rejects_blank_assistant_endpoint() {
    let config = ApiConfig::new("   ", "https://images.example/api/generate");
    let error = ApiClient::new(config).expect_err("blank assistant URL must fail");
    assert!(matches!(error, ApiError::InvalidEndpoint(_)));
}

#[test]
fn client_rejects_blank_image_endpoint() {
    let config = ApiConfig::new("https://assistant.example/api", "");
    let error = ApiClient::new(config).expect_err("blank image URL must fail");
    assert!(matches!(error, ApiError::InvalidEndpoint(_)));
}

#[test]
fn header_map_reflects_bearer_token() {
    let client = ApiClient::new(config().with_bearer_token("tok-9")).expect("client");
    let headers = client.header_map().expect("headers");

    assert_eq!(
        headers
            .get("authorization")
            .expect("authorization header")
            .to_str()
            .expect("header value"),
        "Bearer tok-9"
    );
    assert_eq!(
        headers
            .get("content-type")
            .expect("content-type header")
            .to_str()
            .expect("header value"),
        "application/json"
    );
}

#[test]
fn header_map_omits_authorization_before_sign_in() {
    let client = ApiClient::new(config()).expect("client");
    let headers = client.header_map().expect("headers");
    assert!(headers.get("authorization").is_none());
}
