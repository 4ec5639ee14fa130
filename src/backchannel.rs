/*!
OpenID Connect Client-Initiated Backchannel Authentication (CIBA), poll mode.

See [CIBA Core 1.0](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html).
*/
use crate::deserializers::{expires_in_to_instant, seconds_from_int_or_str};
use crate::error::ClientError;
use crate::polling::{PollingJob, TokenPoll};
use crate::{Client, Params, Provider, Token};
use async_trait::async_trait;
use biscuit::CompactJson;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const GRANT_TYPE_CIBA: &str = "urn:openid:params:grant-type:ciba";

/// Identifies the end-user for whom authentication is requested. Exactly one is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationHint {
    LoginHint(String),
    LoginHintToken(String),
    IdTokenHint(String),
}

impl AuthenticationHint {
    fn param(&self) -> (&'static str, &str) {
        match self {
            AuthenticationHint::LoginHint(hint) => ("login_hint", hint),
            AuthenticationHint::LoginHintToken(hint) => ("login_hint_token", hint),
            AuthenticationHint::IdTokenHint(hint) => ("id_token_hint", hint),
        }
    }
}

/// Backchannel authentication request, [CIBA, section 7.1](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html#auth_request).
#[derive(Debug, Clone)]
pub struct BackChannelAuthentication {
    scope: String,
    hint: AuthenticationHint,
    binding_message: Option<String>,
    user_code: Option<String>,
    requested_expiry: Option<u64>,
}

impl BackChannelAuthentication {
    /// `scope` must contain `openid`.
    pub fn new(scope: impl Into<String>, hint: AuthenticationHint) -> Self {
        Self {
            scope: scope.into(),
            hint,
            binding_message: None,
            user_code: None,
            requested_expiry: None,
        }
    }

    pub fn binding_message(mut self, binding_message: impl Into<String>) -> Self {
        self.binding_message = Some(binding_message.into());
        self
    }

    pub fn user_code(mut self, user_code: impl Into<String>) -> Self {
        self.user_code = Some(user_code.into());
        self
    }

    /// Requested lifetime of the `auth_req_id`, in seconds.
    pub fn requested_expiry(mut self, requested_expiry: u64) -> Self {
        self.requested_expiry = Some(requested_expiry);
        self
    }

    pub(crate) fn params(&self) -> Result<Params, ClientError> {
        if !self.scope.split_whitespace().any(|s| s == "openid") {
            return Err(ClientError::InvalidArgument(
                "backchannel authentication scope must contain openid".to_string(),
            ));
        }
        let (hint_name, hint) = self.hint.param();
        let mut params = Params::new()
            .with("scope", self.scope.as_str())
            .with(hint_name, hint);
        params.set_opt("binding_message", self.binding_message.as_deref());
        params.set_opt("user_code", self.user_code.as_deref());
        params.set_opt(
            "requested_expiry",
            self.requested_expiry.map(|e| e.to_string()),
        );
        Ok(params)
    }
}

/// Backchannel authentication response, [CIBA, section 7.3](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html#auth_response).
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackChannelAuthenticationResponse {
    pub auth_req_id: String,
    #[serde(
        default,
        rename = "expires_in",
        deserialize_with = "expires_in_to_instant"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "seconds_from_int_or_str")]
    pub interval: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackChannelAuthenticationResponse {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |expires| Utc::now() >= expires)
    }
}

/// CIBA token request for one `auth_req_id`.
pub struct BackChannelPoll<'a, P, C> {
    client: &'a Client<P, C>,
    auth_req_id: String,
    extra: Params,
}

#[async_trait]
impl<'a, P, C> TokenPoll for BackChannelPoll<'a, P, C>
where
    P: Provider + Sync,
    C: CompactJson + Send + Sync,
{
    type Output = Token<C>;

    async fn poll_token(&self) -> Result<Token<C>, ClientError> {
        self.client.ciba(&self.auth_req_id, self.extra.clone()).await
    }
}

impl<'a, P, C> std::fmt::Debug for BackChannelPoll<'a, P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackChannelPoll")
            .field("auth_req_id", &self.auth_req_id)
            .finish_non_exhaustive()
    }
}

pub type BackChannelAuthenticationPollingJob<'a, P, C> = PollingJob<BackChannelPoll<'a, P, C>>;

impl<'a, P, C> BackChannelAuthenticationPollingJob<'a, P, C>
where
    P: Provider + Sync,
    C: CompactJson + Send + Sync,
{
    /// A job polling for the token of `response`. `extra` is sent with every token request.
    pub fn for_backchannel(
        client: &'a Client<P, C>,
        response: &BackChannelAuthenticationResponse,
        extra: Params,
    ) -> Self {
        let target = BackChannelPoll {
            client,
            auth_req_id: response.auth_req_id.clone(),
            extra,
        };
        PollingJob::new(target, response.interval, response.expires_at)
    }
}
