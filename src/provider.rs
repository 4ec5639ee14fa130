/*!
OAuth 2.0 providers.
*/
use url::Url;

/// OAuth 2.0 providers.
///
/// Only the token endpoint is mandatory; operations that need another endpoint fail with
/// [`ClientError::MissingEndpoint`](crate::error::ClientError::MissingEndpoint) when the provider
/// does not expose it.
pub trait Provider {
    /// The token endpoint URI.
    ///
    /// See [RFC 6749, section 3.2](http://tools.ietf.org/html/rfc6749#section-3.2).
    fn token_uri(&self) -> &Url;

    /// The authorization endpoint URI.
    ///
    /// See [RFC 6749, section 3.1](http://tools.ietf.org/html/rfc6749#section-3.1).
    fn auth_uri(&self) -> Option<&Url> {
        None
    }

    /// The issuer identifier ID tokens are checked against.
    fn issuer(&self) -> Option<&Url> {
        None
    }

    /// See [RFC 7009](https://tools.ietf.org/html/rfc7009).
    fn revocation_uri(&self) -> Option<&Url> {
        None
    }

    /// See [RFC 7662](https://tools.ietf.org/html/rfc7662).
    fn introspection_uri(&self) -> Option<&Url> {
        None
    }

    fn userinfo_uri(&self) -> Option<&Url> {
        None
    }

    /// See [RFC 8628, section 3.1](https://tools.ietf.org/html/rfc8628#section-3.1).
    fn device_authorization_uri(&self) -> Option<&Url> {
        None
    }

    /// See [OpenID Connect CIBA, section 7](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html#auth_request).
    fn backchannel_authentication_uri(&self) -> Option<&Url> {
        None
    }

    fn jwks_uri(&self) -> Option<&Url> {
        None
    }
}

/// Manually configured endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token_endpoint: Url,
    pub authorization_endpoint: Option<Url>,
    pub issuer: Option<Url>,
    pub revocation_endpoint: Option<Url>,
    pub introspection_endpoint: Option<Url>,
    pub userinfo_endpoint: Option<Url>,
    pub device_authorization_endpoint: Option<Url>,
    pub backchannel_authentication_endpoint: Option<Url>,
    pub jwks_uri: Option<Url>,
}

impl Endpoints {
    pub fn new(token_endpoint: Url) -> Self {
        Self {
            token_endpoint,
            authorization_endpoint: None,
            issuer: None,
            revocation_endpoint: None,
            introspection_endpoint: None,
            userinfo_endpoint: None,
            device_authorization_endpoint: None,
            backchannel_authentication_endpoint: None,
            jwks_uri: None,
        }
    }
}

impl Provider for Endpoints {
    fn token_uri(&self) -> &Url {
        &self.token_endpoint
    }
    fn auth_uri(&self) -> Option<&Url> {
        self.authorization_endpoint.as_ref()
    }
    fn issuer(&self) -> Option<&Url> {
        self.issuer.as_ref()
    }
    fn revocation_uri(&self) -> Option<&Url> {
        self.revocation_endpoint.as_ref()
    }
    fn introspection_uri(&self) -> Option<&Url> {
        self.introspection_endpoint.as_ref()
    }
    fn userinfo_uri(&self) -> Option<&Url> {
        self.userinfo_endpoint.as_ref()
    }
    fn device_authorization_uri(&self) -> Option<&Url> {
        self.device_authorization_endpoint.as_ref()
    }
    fn backchannel_authentication_uri(&self) -> Option<&Url> {
        self.backchannel_authentication_endpoint.as_ref()
    }
    fn jwks_uri(&self) -> Option<&Url> {
        self.jwks_uri.as_ref()
    }
}

#[test]
fn endpoints_urls() {
    let mut endpoints = Endpoints::new(Url::parse("https://as.example.com/token").unwrap());
    assert_eq!("https://as.example.com/token", endpoints.token_uri().as_str());
    assert!(endpoints.revocation_uri().is_none());
    endpoints.revocation_endpoint = Some(Url::parse("https://as.example.com/revoke").unwrap());
    assert!(endpoints.revocation_uri().is_some());
}
