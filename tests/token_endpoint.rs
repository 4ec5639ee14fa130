mod support;

use oauth2client::error::{Decode, Error};
use oauth2client::{
    Bearer, ClientAuthentication, ClientError, ExchangeToken, OAuth2ErrorCode, Params,
    TokenExchange, CLIENT_ASSERTION_TYPE,
};
use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{client, form, form_value, requests_to};

async fn token_response(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn client_credentials_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("authorization", "Basic Zm9vOmJhcg=="))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "2YotnFZFEjr1zCsicMWpAA",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "read"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let token = client
        .client_credentials(Some("read"), Params::new())
        .await
        .unwrap();

    assert_eq!("2YotnFZFEjr1zCsicMWpAA", token.bearer.access_token());
    assert!(!token.bearer.is_expired());
    assert!(token.bearer.expires_in().unwrap() > 3590);
    assert!(!token.is_openid());

    let requests = requests_to(&server, "/token").await;
    let form = form(&requests[0]);
    assert_eq!(Some("read"), form_value(&form, "scope"));
    assert_eq!(None, form_value(&form, "client_id"));
}

#[tokio::test]
async fn extras_never_override_protected_fields() {
    let server = MockServer::start().await;
    token_response(
        &server,
        json!({"access_token": "at", "token_type": "Bearer"}),
    )
    .await;

    let client = client(&server, ClientAuthentication::post("foo", "bar"));
    let extra: Params = [
        ("grant_type", "password"),
        ("client_id", "mallory"),
        ("audience", "https://api.example.com"),
    ]
    .into();
    client.client_credentials(None, extra).await.unwrap();

    let requests = requests_to(&server, "/token").await;
    let form = form(&requests[0]);
    assert_eq!(Some("client_credentials"), form_value(&form, "grant_type"));
    assert_eq!(Some("foo"), form_value(&form, "client_id"));
    assert_eq!(Some("bar"), form_value(&form, "client_secret"));
    assert_eq!(
        Some("https://api.example.com"),
        form_value(&form, "audience")
    );
    assert_eq!(1, form.iter().filter(|(k, _)| k == "grant_type").count());
}

#[tokio::test]
async fn client_secret_jwt_sends_an_assertion() {
    let server = MockServer::start().await;
    token_response(
        &server,
        json!({"access_token": "at", "token_type": "Bearer"}),
    )
    .await;

    let client = client(
        &server,
        ClientAuthentication::client_secret_jwt("foo", "a-shared-secret-of-sufficient-length"),
    );
    client.client_credentials(None, Params::new()).await.unwrap();

    let requests = requests_to(&server, "/token").await;
    assert!(requests[0].headers.get("authorization").is_none());
    let form = form(&requests[0]);
    assert_eq!(
        Some(CLIENT_ASSERTION_TYPE),
        form_value(&form, "client_assertion_type")
    );
    assert_eq!(
        3,
        form_value(&form, "client_assertion")
            .unwrap()
            .split('.')
            .count()
    );
}

#[tokio::test]
async fn authorization_code_sends_redirect_uri_and_verifier() {
    let server = MockServer::start().await;
    token_response(
        &server,
        json!({
            "access_token": "at",
            "token_type": "Bearer",
            "refresh_token": "rt",
            "id_token": "eyJhbGciOiJIUzI1NiJ9.e30.c2ln"
        }),
    )
    .await;

    let client = client(&server, ClientAuthentication::public("foo"));
    let token = client
        .authorization_code("SplxlOBeZQQYbYS6WxSbIA", Some("verifier"), Params::new())
        .await
        .unwrap();
    assert_eq!(Some("rt"), token.bearer.refresh_token());
    assert!(token.is_openid());

    let requests = requests_to(&server, "/token").await;
    let form = form(&requests[0]);
    assert_eq!(Some("authorization_code"), form_value(&form, "grant_type"));
    assert_eq!(Some("SplxlOBeZQQYbYS6WxSbIA"), form_value(&form, "code"));
    assert_eq!(
        Some("https://client.example.org/cb"),
        form_value(&form, "redirect_uri")
    );
    assert_eq!(Some("verifier"), form_value(&form, "code_verifier"));
    assert_eq!(Some("foo"), form_value(&form, "client_id"));
}

#[tokio::test]
async fn refresh_keeps_the_previous_refresh_token() {
    let server = MockServer::start().await;
    token_response(
        &server,
        json!({"access_token": "new", "token_type": "Bearer", "expires_in": "60"}),
    )
    .await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let old = Bearer::new("old", None)
        .with_expires_at(Utc::now() - Duration::seconds(10))
        .with_refresh_token("rt".to_string());
    let token = client
        .refresh_token(&old, None, Params::new())
        .await
        .unwrap();

    assert_eq!("new", token.bearer.access_token());
    assert_eq!(Some("rt"), token.bearer.refresh_token());
    assert_eq!("old", old.access_token());

    let requests = requests_to(&server, "/token").await;
    let form = form(&requests[0]);
    assert_eq!(Some("refresh_token"), form_value(&form, "grant_type"));
    assert_eq!(Some("rt"), form_value(&form, "refresh_token"));
}

#[tokio::test]
async fn authenticate_without_key_set_rejects_the_id_token() {
    let server = MockServer::start().await;
    token_response(
        &server,
        json!({
            "access_token": "at",
            "token_type": "Bearer",
            "id_token": "eyJhbGciOiJIUzI1NiJ9.eyJpc3MiOiJodHRwczovL2V2aWwuZXhhbXBsZS5jb20iLCJhdWQiOiJzb21lb25lLWVsc2UiLCJub25jZSI6ImF0dGFja2VyLW5vbmNlIiwic3ViIjoiMSIsImV4cCI6MSwiaWF0IjoxfQ.c2ln"
        }),
    )
    .await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let request = client
        .authorization_request("openid")
        .unwrap()
        .state("af0ifjsldkj")
        .build()
        .unwrap();
    let err = client
        .authenticate(&request, "code=abc&state=af0ifjsldkj", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(Decode::NoKeySet)));
}

#[tokio::test]
async fn refresh_needs_a_refresh_token() {
    let server = MockServer::start().await;
    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let err = client
        .refresh_token(&Bearer::new("at", 60), None, Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
    assert!(requests_to(&server, "/token").await.is_empty());
}

#[tokio::test]
async fn ensure_token_only_refreshes_expired_tokens() {
    let server = MockServer::start().await;
    token_response(
        &server,
        json!({"access_token": "fresh", "token_type": "Bearer", "expires_in": 3600}),
    )
    .await;
    let client = client(&server, ClientAuthentication::basic("foo", "bar"));

    let valid = Bearer::new("valid", 3600).with_refresh_token("rt".to_string());
    assert_eq!(
        "valid",
        client.ensure_token(valid).await.unwrap().access_token()
    );
    assert!(requests_to(&server, "/token").await.is_empty());

    let expired = Bearer::new("expired", None)
        .with_expires_at(Utc::now() - Duration::seconds(10))
        .with_refresh_token("rt".to_string());
    assert_eq!(
        "fresh",
        client.ensure_token(expired).await.unwrap().access_token()
    );
}

#[tokio::test]
async fn token_exchange_resolves_token_types() {
    let server = MockServer::start().await;
    token_response(
        &server,
        json!({
            "access_token": "exchanged",
            "issued_token_type": "urn:ietf:params:oauth:token-type:access_token",
            "token_type": "N_A"
        }),
    )
    .await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let request = TokenExchange::new(ExchangeToken::id_token("eyJ.subject.token"))
        .requested_token_type("access_token")
        .audience("urn:example:cooperation-context");
    let token = client.token_exchange(&request, Params::new()).await.unwrap();
    assert_eq!("exchanged", token.bearer.access_token());
    assert_eq!("N_A", token.bearer.token_type());
    assert!(token.bearer.contains("issued_token_type"));

    let requests = requests_to(&server, "/token").await;
    let form = form(&requests[0]);
    assert_eq!(
        Some("urn:ietf:params:oauth:grant-type:token-exchange"),
        form_value(&form, "grant_type")
    );
    assert_eq!(
        Some("urn:ietf:params:oauth:token-type:id_token"),
        form_value(&form, "subject_token_type")
    );
    assert_eq!(
        Some("urn:ietf:params:oauth:token-type:access_token"),
        form_value(&form, "requested_token_type")
    );
}

#[tokio::test]
async fn standard_error_is_raised_as_oauth2_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "code already used"
        })))
        .mount(&server)
        .await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let err = client
        .authorization_code("code", None, Params::new())
        .await
        .unwrap_err();
    match err {
        ClientError::OAuth2(err) => {
            assert_eq!(OAuth2ErrorCode::InvalidGrant, err.error);
            assert_eq!(Some("code already used"), err.error_description.as_deref());
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[tokio::test]
async fn unknown_error_codes_are_kept() {
    let server = MockServer::start().await;
    token_response(&server, json!({"error": "vendor_specific"})).await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let err = client
        .client_credentials(None, Params::new())
        .await
        .unwrap_err();
    assert_eq!(
        Some(&OAuth2ErrorCode::Unrecognized("vendor_specific".into())),
        err.oauth2_code()
    );
}

#[tokio::test]
async fn non_oauth_failure_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let err = client
        .client_credentials(None, Params::new())
        .await
        .unwrap_err();
    match err {
        ClientError::UnexpectedResponse { status, body, .. } => {
            assert_eq!(502, status);
            assert!(body.contains("Bad Gateway"));
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[tokio::test]
async fn success_without_access_token_is_invalid() {
    let server = MockServer::start().await;
    token_response(&server, json!({"token_type": "Bearer"})).await;

    let client = client(&server, ClientAuthentication::basic("foo", "bar"));
    let err = client
        .client_credentials(None, Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}
