/*!
OAuth 2.0 errors.
*/
use serde::Deserialize;
use std::{error, fmt};
use thiserror::Error;
use url::Url;

/// OAuth 2.0 error.
///
/// See [RFC 6749, section 5.2](http://tools.ietf.org/html/rfc6749#section-5.2).
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Error {
    /// Error code.
    pub error: OAuth2ErrorCode,

    /// Human-readable text providing additional information about the error.
    pub error_description: Option<String>,

    /// A URI identifying a human-readable web page with information about the error.
    pub error_uri: Option<String>,
}

impl OAuth2Error {
    /// Builds an error carrying only a code.
    pub fn new(error: OAuth2ErrorCode) -> Self {
        Self {
            error,
            error_description: None,
            error_uri: None,
        }
    }

    pub(crate) fn with_description(mut self, description: impl Into<String>) -> Self {
        self.error_description = Some(description.into());
        self
    }
}

impl fmt::Display for OAuth2Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.error.as_str())?;
        if let Some(ref description) = self.error_description {
            write!(f, ": {}", description)?;
        }
        if let Some(ref uri) = self.error_uri {
            write!(f, " ({})", uri)?;
        }
        Ok(())
    }
}

impl error::Error for OAuth2Error {}

/// OAuth 2.0 error codes.
///
/// Covers [RFC 6749, section 5.2](http://tools.ietf.org/html/rfc6749#section-5.2) and
/// [section 4.1.2.1](http://tools.ietf.org/html/rfc6749#section-4.1.2.1), token revocation
/// ([RFC 7009](https://tools.ietf.org/html/rfc7009#section-2.2.1)), the device authorization
/// grant ([RFC 8628, section 3.5](https://tools.ietf.org/html/rfc8628#section-3.5)), CIBA and
/// the OpenID Connect authentication errors.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String")]
pub enum OAuth2ErrorCode {
    /// The request is missing a required parameter, includes an unsupported parameter value (other
    /// than grant type), repeats a parameter, includes multiple credentials, utilizes more than
    /// one mechanism for authenticating the client, or is otherwise malformed.
    InvalidRequest,

    /// Client authentication failed (e.g., unknown client, no client authentication included, or
    /// unsupported authentication method).
    InvalidClient,

    /// The provided authorization grant (e.g., authorization code, resource owner credentials) or
    /// refresh token is invalid, expired, revoked, does not match the redirection URI used in the
    /// authorization request, or was issued to another client.
    InvalidGrant,

    /// The authenticated client is not authorized to use this authorization grant type.
    UnauthorizedClient,

    /// The authorization grant type is not supported by the authorization server.
    UnsupportedGrantType,

    /// The requested scope is invalid, unknown, malformed, or exceeds the scope granted by the
    /// resource owner.
    InvalidScope,

    /// The resource owner or authorization server denied the request.
    AccessDenied,

    /// The authorization server does not support obtaining a code using this method.
    UnsupportedResponseType,

    /// The user has not yet completed the device or backchannel authorization.
    AuthorizationPending,

    /// Still pending, the client must increase its polling interval.
    SlowDown,

    /// The device code or `auth_req_id` has expired.
    ExpiredToken,

    /// The authorization server does not support revocation of the presented token type.
    UnsupportedTokenType,

    /// The authorization server encountered an unexpected condition.
    ServerError,

    /// The authorization server is currently unable to handle the request.
    TemporarilyUnavailable,

    /// The authorization server requires end-user interaction of some form to proceed.
    InteractionRequired,

    /// The authorization server requires end-user authentication.
    LoginRequired,

    /// The authorization server requires end-user consent.
    ConsentRequired,

    /// An unrecognized error code, preserved verbatim.
    Unrecognized(String),
}

impl OAuth2ErrorCode {
    /// The wire representation of the code.
    pub fn as_str(&self) -> &str {
        match self {
            OAuth2ErrorCode::InvalidRequest => "invalid_request",
            OAuth2ErrorCode::InvalidClient => "invalid_client",
            OAuth2ErrorCode::InvalidGrant => "invalid_grant",
            OAuth2ErrorCode::UnauthorizedClient => "unauthorized_client",
            OAuth2ErrorCode::UnsupportedGrantType => "unsupported_grant_type",
            OAuth2ErrorCode::InvalidScope => "invalid_scope",
            OAuth2ErrorCode::AccessDenied => "access_denied",
            OAuth2ErrorCode::UnsupportedResponseType => "unsupported_response_type",
            OAuth2ErrorCode::AuthorizationPending => "authorization_pending",
            OAuth2ErrorCode::SlowDown => "slow_down",
            OAuth2ErrorCode::ExpiredToken => "expired_token",
            OAuth2ErrorCode::UnsupportedTokenType => "unsupported_token_type",
            OAuth2ErrorCode::ServerError => "server_error",
            OAuth2ErrorCode::TemporarilyUnavailable => "temporarily_unavailable",
            OAuth2ErrorCode::InteractionRequired => "interaction_required",
            OAuth2ErrorCode::LoginRequired => "login_required",
            OAuth2ErrorCode::ConsentRequired => "consent_required",
            OAuth2ErrorCode::Unrecognized(code) => code,
        }
    }
}

impl<'a> From<&'a str> for OAuth2ErrorCode {
    fn from(s: &str) -> OAuth2ErrorCode {
        match s {
            "invalid_request" => OAuth2ErrorCode::InvalidRequest,
            "invalid_client" => OAuth2ErrorCode::InvalidClient,
            "invalid_grant" => OAuth2ErrorCode::InvalidGrant,
            "unauthorized_client" => OAuth2ErrorCode::UnauthorizedClient,
            "unsupported_grant_type" => OAuth2ErrorCode::UnsupportedGrantType,
            "invalid_scope" => OAuth2ErrorCode::InvalidScope,
            "access_denied" => OAuth2ErrorCode::AccessDenied,
            "unsupported_response_type" => OAuth2ErrorCode::UnsupportedResponseType,
            "authorization_pending" => OAuth2ErrorCode::AuthorizationPending,
            "slow_down" => OAuth2ErrorCode::SlowDown,
            "expired_token" => OAuth2ErrorCode::ExpiredToken,
            "unsupported_token_type" => OAuth2ErrorCode::UnsupportedTokenType,
            "server_error" => OAuth2ErrorCode::ServerError,
            "temporarily_unavailable" => OAuth2ErrorCode::TemporarilyUnavailable,
            "interaction_required" => OAuth2ErrorCode::InteractionRequired,
            "login_required" => OAuth2ErrorCode::LoginRequired,
            "consent_required" => OAuth2ErrorCode::ConsentRequired,
            s => OAuth2ErrorCode::Unrecognized(s.to_owned()),
        }
    }
}

impl From<String> for OAuth2ErrorCode {
    fn from(s: String) -> OAuth2ErrorCode {
        OAuth2ErrorCode::from(s.as_str())
    }
}

/// Errors raised by calls to the authorization server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error, the request never produced an answer.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// JSON error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// OAuth 2.0 error returned by the authorization server.
    #[error(transparent)]
    OAuth2(#[from] OAuth2Error),

    /// The server answered with something that is not an OAuth 2.0 response.
    #[error("unexpected response from {url} (HTTP {status}): {body}")]
    UnexpectedResponse {
        url: Url,
        status: u16,
        body: String,
    },

    /// A successful response that misses mandatory fields.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider does not expose the required endpoint.
    #[error("provider has no {0}")]
    MissingEndpoint(&'static str),

    /// The request can not be built from the given arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Signing a client assertion failed.
    #[error("unable to sign client assertion: {0}")]
    Assertion(#[source] Jose),

    /// The polling job has already delivered its token.
    #[error("polling job already completed")]
    PollingCompleted,
}

impl ClientError {
    /// The OAuth 2.0 error code, when the server answered with one.
    pub fn oauth2_code(&self) -> Option<&OAuth2ErrorCode> {
        match self {
            ClientError::OAuth2(err) => Some(&err.error),
            _ => None,
        }
    }
}

pub use biscuit::errors::Error as Jose;
pub use reqwest::Error as Http;
pub use serde_json::Error as Json;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Jose(#[from] Jose),
    #[error(transparent)]
    Http(#[from] Http),
    #[error(transparent)]
    Json(#[from] Json),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Decode(#[from] Decode),
    #[error(transparent)]
    Validation(#[from] Validation),
    #[error("authorization failed: {0}")]
    Authorization(OAuth2Error),
    #[error("Url: Path segments is cannot-be-a-base")]
    CannotBeABase,
    #[error("random source failure: {0}")]
    Random(getrandom::Error),
    #[error(transparent)]
    ClientError(#[from] ClientError),
}

impl From<getrandom::Error> for Error {
    fn from(e: getrandom::Error) -> Self {
        Error::Random(e)
    }
}

#[derive(Debug, Error)]
pub enum Decode {
    #[error("Token Missing a Key Id when the key set has multiple keys")]
    MissingKid,
    #[error("Token wants this key id not in the key set: {0}")]
    MissingKey(String),
    #[error("JWK Set is empty")]
    EmptySet,
    #[error("Client has no JWK Set to verify the token with")]
    NoKeySet,
    #[error("Token signed with unsupported key type: {0}")]
    UnsupportedKey(String),
}

#[derive(Debug, Error)]
pub enum Validation {
    #[error(transparent)]
    Mismatch(#[from] Mismatch),
    #[error(transparent)]
    Missing(#[from] Missing),
    #[error(transparent)]
    Expired(#[from] Expiry),
    #[error("Invalid PKCE code verifier: {0}")]
    CodeVerifier(String),
}

#[derive(Debug, Error)]
pub enum Mismatch {
    #[error("Client ID and Token authorized party mismatch: '{expected}', '{actual}'")]
    AuthorizedParty { expected: String, actual: String },
    #[error("Configured issuer and token issuer mismatch: '{expected}' '{actual}'")]
    Issuer { expected: String, actual: String },
    #[error("Given nonce does not match token nonce: '{expected}', '{actual}'")]
    Nonce { expected: String, actual: String },
    #[error("Authorization response state does not match request state: '{expected}', '{actual}'")]
    State { expected: String, actual: String },
}

#[derive(Debug, Error)]
pub enum Missing {
    #[error("Token missing Audience")]
    Audience,
    #[error("Token missing AZP")]
    AuthorizedParty,
    #[error("Token missing Auth Time")]
    AuthTime,
    #[error("Token missing Nonce")]
    Nonce,
    #[error("Authorization response missing state")]
    State,
    #[error("Authorization response missing code")]
    Code,
}

#[derive(Debug, Error)]
pub enum Expiry {
    #[error("Token expired at: {0}")]
    Expires(chrono::DateTime<chrono::Utc>),
    #[error("Token is too old: {0}")]
    MaxAge(chrono::Duration),
    #[error("Token exp is not a valid UNIX timestamp: {0}")]
    NotUnix(i64),
}
