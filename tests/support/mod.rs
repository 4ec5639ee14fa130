#![allow(dead_code)]

use oauth2client::{Client, ClientAuthentication, Endpoints, StandardClaims};
use url::Url;
use wiremock::{MockServer, Request};

pub fn endpoint(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), path)).unwrap()
}

/// All endpoints of a provider served by `server`.
pub fn endpoints(server: &MockServer) -> Endpoints {
    let mut endpoints = Endpoints::new(endpoint(server, "/token"));
    endpoints.authorization_endpoint = Some(endpoint(server, "/authorize"));
    endpoints.revocation_endpoint = Some(endpoint(server, "/revoke"));
    endpoints.introspection_endpoint = Some(endpoint(server, "/introspect"));
    endpoints.userinfo_endpoint = Some(endpoint(server, "/userinfo"));
    endpoints.device_authorization_endpoint = Some(endpoint(server, "/device"));
    endpoints.backchannel_authentication_endpoint = Some(endpoint(server, "/bc-authorize"));
    endpoints
}

pub fn client(
    server: &MockServer,
    auth: ClientAuthentication,
) -> Client<Endpoints, StandardClaims> {
    Client::new(
        endpoints(server),
        auth,
        Some("https://client.example.org/cb".to_string()),
        reqwest::Client::new(),
        None,
    )
}

/// The decoded form body of a request.
pub fn form(request: &Request) -> Vec<(String, String)> {
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

pub fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
    form.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .collect()
}
