use crate::error::{ClientError, Error, Mismatch, Validation};
use crate::{Config, Provider};
use biscuit::jwk::JWKSet;
use biscuit::Empty;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::Client;
use url::Url;

/// A provider described by its discovery document.
#[derive(Debug, Clone)]
pub struct Discovered(pub Config);

impl Provider for Discovered {
    fn token_uri(&self) -> &Url {
        &self.0.token_endpoint
    }
    fn auth_uri(&self) -> Option<&Url> {
        self.0.authorization_endpoint.as_ref()
    }
    fn issuer(&self) -> Option<&Url> {
        Some(&self.0.issuer)
    }
    fn revocation_uri(&self) -> Option<&Url> {
        self.0.revocation_endpoint.as_ref()
    }
    fn introspection_uri(&self) -> Option<&Url> {
        self.0.introspection_endpoint.as_ref()
    }
    fn userinfo_uri(&self) -> Option<&Url> {
        self.0.userinfo_endpoint.as_ref()
    }
    fn device_authorization_uri(&self) -> Option<&Url> {
        self.0.device_authorization_endpoint.as_ref()
    }
    fn backchannel_authentication_uri(&self) -> Option<&Url> {
        self.0.backchannel_authentication_endpoint.as_ref()
    }
    fn jwks_uri(&self) -> Option<&Url> {
        self.0.jwks_uri.as_ref()
    }
}

/// Fetches `<issuer>/.well-known/openid-configuration` and checks it describes `issuer`.
pub async fn discover(client: &Client, issuer: Url) -> Result<Config, Error> {
    let mut url = issuer.clone();
    url.path_segments_mut()
        .map_err(|_| Error::CannotBeABase)?
        .pop_if_empty()
        .extend(&[".well-known", "openid-configuration"]);
    let config = fetch_config(client, url).await?;
    if !same_issuer(&config.issuer, &issuer) {
        let expected = issuer.to_string();
        let actual = config.issuer.to_string();
        return Err(Validation::Mismatch(Mismatch::Issuer { expected, actual }).into());
    }
    Ok(config)
}

/// Fetches a discovery document from an explicit location.
pub async fn fetch_config(client: &Client, url: Url) -> Result<Config, Error> {
    debug!("fetching provider metadata from {}", url);
    let resp = client
        .get(url.clone())
        .header(ACCEPT, mime::APPLICATION_JSON.as_ref())
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await?;
        return Err(ClientError::UnexpectedResponse {
            url,
            status: status.as_u16(),
            body,
        }
        .into());
    }
    resp.json().await.map_err(Error::from)
}

/// Get the JWK set from the given Url.
pub async fn jwks(client: &Client, url: Url) -> Result<JWKSet<Empty>, Error> {
    debug!("fetching key set from {}", url);
    let resp = client.get(url).send().await?.error_for_status()?;
    resp.json().await.map_err(Error::from)
}

// A trailing slash is not significant for the comparison
fn same_issuer(a: &Url, b: &Url) -> bool {
    a.as_str().trim_end_matches('/') == b.as_str().trim_end_matches('/')
}
