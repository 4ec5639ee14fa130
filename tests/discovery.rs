use biscuit::jwa::SignatureAlgorithm;
use biscuit::jws::{Header, RegisteredHeader, Secret};
use chrono::Utc;
use oauth2client::error::{Error, Mismatch, Validation};
use oauth2client::{
    ClientAuthentication, DiscoveredClient, IdToken, Provider, StandardClaims,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHARED_KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

fn issuer(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

async fn serve_metadata(server: &MockServer, issuer: &str) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{}/authorize", server.uri()),
            "token_endpoint": format!("{}/token", server.uri()),
            "jwks_uri": format!("{}/jwks", server.uri()),
            "revocation_endpoint": format!("{}/revoke", server.uri()),
            "response_types_supported": ["code"],
            "subject_types_supported": ["public"],
            "id_token_signing_alg_values_supported": ["HS256"]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [{
                "kty": "oct",
                "kid": "k1",
                "alg": "HS256",
                "k": "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY"
            }]
        })))
        .mount(server)
        .await;
}

fn id_token(issuer: &Url, nonce: &str) -> String {
    let now = Utc::now().timestamp();
    let claims: StandardClaims = serde_json::from_value(json!({
        "iss": issuer.as_str(),
        "sub": "248289761001",
        "aud": "foo",
        "exp": now + 600,
        "iat": now,
        "nonce": nonce,
        "email": "janedoe@example.com"
    }))
    .unwrap();
    let header = Header::from(RegisteredHeader {
        algorithm: SignatureAlgorithm::HS256,
        key_id: Some("k1".to_string()),
        ..Default::default()
    });
    IdToken::new_decoded(header, claims)
        .into_encoded(&Secret::Bytes(SHARED_KEY.to_vec()))
        .unwrap()
        .encoded()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn discovers_endpoints_and_keys() {
    let server = MockServer::start().await;
    let issuer = issuer(&server);
    serve_metadata(&server, issuer.as_str()).await;

    let client = DiscoveredClient::discover(
        ClientAuthentication::basic("foo", "bar"),
        None,
        issuer.clone(),
    )
    .await
    .unwrap();

    assert_eq!(issuer, client.config().issuer);
    assert_eq!(
        format!("{}/token", server.uri()),
        client.provider.token_uri().as_str()
    );
    assert!(client.provider.revocation_uri().is_some());
    assert!(client.provider.introspection_uri().is_none());
    assert_eq!(1, client.jwks.as_ref().unwrap().keys.len());
    assert!(client.config().other.contains_key("subject_types_supported"));
}

#[tokio::test]
async fn rejects_a_foreign_issuer() {
    let server = MockServer::start().await;
    serve_metadata(&server, "https://evil.example.com/").await;

    let err = DiscoveredClient::discover(
        ClientAuthentication::basic("foo", "bar"),
        None,
        issuer(&server),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(Validation::Mismatch(Mismatch::Issuer { .. }))
    ));
}

#[tokio::test]
async fn authenticate_validates_the_id_token() {
    let server = MockServer::start().await;
    let issuer = issuer(&server);
    serve_metadata(&server, issuer.as_str()).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=SplxlOBeZQQYbYS6WxSbIA"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "SlAV32hkKG",
            "token_type": "Bearer",
            "expires_in": 3600,
            "id_token": id_token(&issuer, "n-0S6_WzA2Mj")
        })))
        .mount(&server)
        .await;

    let client = DiscoveredClient::discover(
        ClientAuthentication::basic("foo", "bar"),
        Some("https://client.example.org/cb".to_string()),
        issuer,
    )
    .await
    .unwrap();
    let request = client
        .authorization_request("openid email")
        .unwrap()
        .state("af0ifjsldkj")
        .nonce("n-0S6_WzA2Mj")
        .build()
        .unwrap();

    let callback = "https://client.example.org/cb?code=SplxlOBeZQQYbYS6WxSbIA&state=af0ifjsldkj";
    let token = client.authenticate(&request, callback, None).await.unwrap();
    let claims = token.id_token.as_ref().unwrap().payload().unwrap();
    assert_eq!("248289761001", claims.sub);
    assert_eq!(Some(&json!("janedoe@example.com")), claims.other.get("email"));

    let forged = "https://client.example.org/cb?code=SplxlOBeZQQYbYS6WxSbIA&state=forged";
    let err = client.authenticate(&request, forged, None).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(Validation::Mismatch(Mismatch::State { .. }))
    ));
}

#[tokio::test]
async fn authenticate_rejects_a_replayed_nonce() {
    let server = MockServer::start().await;
    let issuer = issuer(&server);
    serve_metadata(&server, issuer.as_str()).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "SlAV32hkKG",
            "token_type": "Bearer",
            "id_token": id_token(&issuer, "other-nonce")
        })))
        .mount(&server)
        .await;

    let client = DiscoveredClient::discover(
        ClientAuthentication::basic("foo", "bar"),
        Some("https://client.example.org/cb".to_string()),
        issuer,
    )
    .await
    .unwrap();
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
    assert!(matches!(
        err,
        Error::Validation(Validation::Mismatch(Mismatch::Nonce { .. }))
    ));
}
