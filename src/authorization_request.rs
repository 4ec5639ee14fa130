/*!
Front-channel authorization requests.

See [RFC 6749, section 4.1.1](https://tools.ietf.org/html/rfc6749#section-4.1.1) and
[OpenID Connect Core, section 3.1.2.1](https://openid.net/specs/openid-connect-core-1_0.html#AuthRequest).
*/
use crate::error::{Error, Missing, OAuth2Error, OAuth2ErrorCode, Validation};
use crate::pkce::{CodeChallengeMethod, Pkce};
use crate::random::random_string;
use crate::validation::validate_state;
use crate::Params;
use chrono::Duration;
use std::fmt;
use url::{form_urlencoded, Url};

/// Parameters generated by the client itself, never taken from caller extras.
const RESERVED: &[&str] = &[
    "response_type",
    "client_id",
    "redirect_uri",
    "scope",
    "state",
    "nonce",
    "code_challenge",
    "code_challenge_method",
];

/// Builds an [`AuthorizationRequest`].
#[derive(Debug, Clone)]
pub struct AuthorizationRequestBuilder {
    authorization_endpoint: Url,
    client_id: String,
    redirect_uri: Option<String>,
    scope: Option<String>,
    response_type: String,
    state: Option<String>,
    nonce: Option<String>,
    code_challenge_method: Option<CodeChallengeMethod>,
    code_verifier: Option<String>,
    extra: Params,
}

impl AuthorizationRequestBuilder {
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Space separated scopes.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Defaults to `code`.
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = response_type.into();
        self
    }

    /// Uses a caller provided `state` instead of a random one.
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Uses a caller provided `nonce` instead of a random one.
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// PKCE method, `S256` by default. `None` disables PKCE.
    pub fn code_challenge_method(mut self, method: impl Into<Option<CodeChallengeMethod>>) -> Self {
        self.code_challenge_method = method.into();
        self
    }

    /// Uses a caller provided code verifier instead of a random one.
    pub fn code_verifier(mut self, code_verifier: impl Into<String>) -> Self {
        self.code_verifier = Some(code_verifier.into());
        self
    }

    /// Adds an extra query parameter, such as `login_hint`, `acr_values` or `response_mode`.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.set(key, value);
        self
    }

    /// Space separated `prompt` values.
    pub fn prompt(self, prompt: impl Into<String>) -> Self {
        self.param("prompt", prompt)
    }

    pub fn max_age(self, max_age: Duration) -> Self {
        self.param("max_age", max_age.num_seconds().to_string())
    }

    pub fn login_hint(self, login_hint: impl Into<String>) -> Self {
        self.param("login_hint", login_hint)
    }

    pub fn build(self) -> Result<AuthorizationRequest, Error> {
        let state = match self.state {
            Some(state) => state,
            None => random_string(32)?,
        };
        let nonce = match self.nonce {
            Some(nonce) => nonce,
            None => random_string(32)?,
        };
        let pkce = match (self.code_challenge_method, self.code_verifier) {
            (None, _) => None,
            (Some(method), Some(verifier)) => Some(Pkce::from_verifier(verifier, method)?),
            (Some(method), None) => Some(Pkce::generate(method)?),
        };
        let mut extra = Params::new();
        extra.merge(self.extra, RESERVED);
        Ok(AuthorizationRequest {
            authorization_endpoint: self.authorization_endpoint,
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            scope: self.scope,
            response_type: self.response_type,
            state,
            nonce,
            pkce,
            extra,
        })
    }
}

/// A single authorization attempt: the URL to send the user to, and the values needed to
/// validate the response and redeem the code.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    authorization_endpoint: Url,
    client_id: String,
    redirect_uri: Option<String>,
    scope: Option<String>,
    response_type: String,
    state: String,
    nonce: String,
    pkce: Option<Pkce>,
    extra: Params,
}

impl AuthorizationRequest {
    pub fn builder(
        authorization_endpoint: Url,
        client_id: impl Into<String>,
    ) -> AuthorizationRequestBuilder {
        AuthorizationRequestBuilder {
            authorization_endpoint,
            client_id: client_id.into(),
            redirect_uri: None,
            scope: None,
            response_type: "code".to_string(),
            state: None,
            nonce: None,
            code_challenge_method: Some(CodeChallengeMethod::default()),
            code_verifier: None,
            extra: Params::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn pkce(&self) -> Option<&Pkce> {
        self.pkce.as_ref()
    }

    pub fn code_verifier(&self) -> Option<&str> {
        self.pkce.as_ref().map(Pkce::code_verifier)
    }

    /// Whether the `openid` scope was requested.
    pub fn is_openid(&self) -> bool {
        self.scope
            .as_deref()
            .map_or(false, |s| s.split_whitespace().any(|s| s == "openid"))
    }

    /// The query parameters, in canonical order.
    pub fn params(&self) -> Params {
        let mut params = Params::new()
            .with("response_type", self.response_type.as_str())
            .with("client_id", self.client_id.as_str());
        params.set_opt("redirect_uri", self.redirect_uri.as_deref());
        params.set_opt("scope", self.scope.as_deref());
        params.set("state", self.state.as_str());
        params.set("nonce", self.nonce.as_str());
        if let Some(ref pkce) = self.pkce {
            params.set("code_challenge", pkce.code_challenge());
            params.set(
                "code_challenge_method",
                pkce.code_challenge_method().as_str(),
            );
        }
        params.merge(self.extra.clone(), RESERVED);
        params
    }

    /// The URL to redirect the user agent to.
    pub fn uri(&self) -> Url {
        let mut uri = self.authorization_endpoint.clone();
        uri.query_pairs_mut().extend_pairs(self.params().iter());
        uri
    }

    /// Validates the redirect back from the authorization server and returns the code.
    ///
    /// `callback` is either the full redirect URL or its raw query string.
    pub fn validate_callback(&self, callback: &str) -> Result<String, Error> {
        let params: Params = match Url::parse(callback) {
            Ok(url) => match url.query() {
                Some(query) => parse_query(query),
                None => parse_query(url.fragment().unwrap_or_default()),
            },
            Err(_) => parse_query(callback.trim_start_matches('?')),
        };
        self.validate_callback_params(params)
    }

    /// Validates already parsed callback parameters and returns the code.
    pub fn validate_callback_params<I, K, V>(&self, params: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params: Params = params.into_iter().collect();
        let state = params.get("state");

        if let Some(error) = params.get("error") {
            // a forged error response is still a forgery
            if state.is_some() {
                validate_state(&self.state, state)?;
            }
            return Err(Error::Authorization(OAuth2Error {
                error: OAuth2ErrorCode::from(error),
                error_description: params.get("error_description").map(str::to_string),
                error_uri: params.get("error_uri").map(str::to_string),
            }));
        }

        validate_state(&self.state, state)?;

        match params.get("code") {
            Some(code) if !code.is_empty() => Ok(code.to_string()),
            _ => Err(Validation::Missing(Missing::Code).into()),
        }
    }
}

impl fmt::Display for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

fn parse_query(query: &str) -> Params {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
