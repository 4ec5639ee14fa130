/*!
OAuth 2.0 Device Authorization Grant.

See [RFC 8628](https://tools.ietf.org/html/rfc8628).
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

pub const GRANT_TYPE_DEVICE_CODE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Device authorization response, [RFC 8628, section 3.2](https://tools.ietf.org/html/rfc8628#section-3.2).
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceAuthorizationResponse {
    pub device_code: String,
    pub user_code: String,
    // some providers still use the draft name
    #[serde(alias = "verification_url")]
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    #[serde(
        default,
        rename = "expires_in",
        deserialize_with = "expires_in_to_instant"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "seconds_from_int_or_str")]
    pub interval: Option<u64>,
    /// Scope sent with the authorization request, never read from the response.
    #[serde(skip)]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceAuthorizationResponse {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |expires| Utc::now() >= expires)
    }
}

/// Device access token request for one `device_code`.
pub struct DeviceCodePoll<'a, P, C> {
    client: &'a Client<P, C>,
    device_code: String,
    scope: Option<String>,
    extra: Params,
}

#[async_trait]
impl<'a, P, C> TokenPoll for DeviceCodePoll<'a, P, C>
where
    P: Provider + Sync,
    C: CompactJson + Send + Sync,
{
    type Output = Token<C>;

    async fn poll_token(&self) -> Result<Token<C>, ClientError> {
        self.client
            .device_code(&self.device_code, self.scope.as_deref(), self.extra.clone())
            .await
    }
}

impl<'a, P, C> std::fmt::Debug for DeviceCodePoll<'a, P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCodePoll")
            .field("device_code", &self.device_code)
            .finish_non_exhaustive()
    }
}

pub type DeviceAuthorizationPollingJob<'a, P, C> = PollingJob<DeviceCodePoll<'a, P, C>>;

impl<'a, P, C> DeviceAuthorizationPollingJob<'a, P, C>
where
    P: Provider + Sync,
    C: CompactJson + Send + Sync,
{
    /// A job polling for the token of `response`. `extra` is sent with every token request.
    pub fn for_device(
        client: &'a Client<P, C>,
        response: &DeviceAuthorizationResponse,
        extra: Params,
    ) -> Self {
        let target = DeviceCodePoll {
            client,
            device_code: response.device_code.clone(),
            scope: response.scope.clone(),
            extra,
        };
        PollingJob::new(target, response.interval, response.expires_at)
    }
}
