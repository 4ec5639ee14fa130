use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Config represents an OpenID / OAuth 2.0 provider metadata.
///
/// OpenID / OAuth 2.0 Providers have metadata describing their configuration.
/// These OpenID / OAuth 2.0 Provider Metadata values are used by OpenID Connect
/// / OAuth 2.0 Authorization.
///
/// See:
///
/// - [OpenID Connect Discovery 1.0: OpenID Provider Metadata](https://openid.net/specs/openid-connect-discovery-1_0.html#ProviderMetadata)
/// - [https://datatracker.ietf.org/doc/html/rfc8414](https://datatracker.ietf.org/doc/html/rfc8414)
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// The authorization server's issuer identifier.
    ///
    /// This MUST be identical to the `iss` Claim value in ID Tokens issued from this Issuer.
    pub issuer: Url,
    /// URL of the OAuth 2.0 Authorization Endpoint.
    ///
    /// Absent for servers that only support grants without a front channel.
    #[serde(default)]
    pub authorization_endpoint: Option<Url>,
    /// URL of the OAuth 2.0 Token Endpoint.
    pub token_endpoint: Url,
    /// URL of the UserInfo Endpoint.
    #[serde(default)]
    pub userinfo_endpoint: Option<Url>,
    /// URL of the JWK Set document holding the keys ID tokens are signed with.
    #[serde(default)]
    pub jwks_uri: Option<Url>,
    /// The dynamic client registration endpoint.
    #[serde(default)]
    pub registration_endpoint: Option<Url>,
    /// Token revocation endpoint ([RFC 7009](https://tools.ietf.org/html/rfc7009)).
    #[serde(default)]
    pub revocation_endpoint: Option<Url>,
    /// Token introspection endpoint ([RFC 7662](https://tools.ietf.org/html/rfc7662)).
    #[serde(default)]
    pub introspection_endpoint: Option<Url>,
    /// Device authorization endpoint ([RFC 8628](https://tools.ietf.org/html/rfc8628)).
    #[serde(default)]
    pub device_authorization_endpoint: Option<Url>,
    /// Backchannel authentication endpoint (OpenID Connect CIBA).
    #[serde(default)]
    pub backchannel_authentication_endpoint: Option<Url>,
    /// The end session endpoint.
    #[serde(default)]
    pub end_session_endpoint: Option<Url>,
    #[serde(default)]
    pub scopes_supported: Option<Vec<String>>,
    #[serde(default)]
    pub response_types_supported: Option<Vec<String>>,
    #[serde(default)]
    pub grant_types_supported: Option<Vec<String>>,
    #[serde(default)]
    pub token_endpoint_auth_methods_supported: Option<Vec<String>>,
    #[serde(default)]
    pub token_endpoint_auth_signing_alg_values_supported: Option<Vec<String>>,
    #[serde(default)]
    pub code_challenge_methods_supported: Option<Vec<String>>,
    #[serde(default)]
    pub backchannel_token_delivery_modes_supported: Option<Vec<String>>,
    /// Metadata this crate does not interpret.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_unrecognized_keys() {
        let json = r#"{
            "issuer": "https://server.example.com",
            "token_endpoint": "https://server.example.com/token",
            "device_authorization_endpoint": "https://server.example.com/device",
            "mtls_endpoint_aliases": {"token_endpoint": "https://mtls.example.com/token"},
            "frontchannel_logout_supported": true
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(None, config.authorization_endpoint);
        assert_eq!(
            "https://server.example.com/device",
            config.device_authorization_endpoint.unwrap().as_str()
        );
        assert!(config.other.contains_key("mtls_endpoint_aliases"));
        assert_eq!(
            Some(&Value::Bool(true)),
            config.other.get("frontchannel_logout_supported")
        );
        assert!(!config.other.contains_key("token_endpoint"));
    }
}
