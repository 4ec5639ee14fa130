/*!
Polling of the token endpoint while the user approves a device or backchannel authorization.

See [RFC 8628, section 3.5](https://tools.ietf.org/html/rfc8628#section-3.5) and
[OpenID Connect CIBA, section 11](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html#token_error_response).
*/
use crate::error::{ClientError, OAuth2Error, OAuth2ErrorCode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::time::Duration;

/// Interval used when the server does not dictate one, in seconds.
pub const DEFAULT_INTERVAL: u64 = 5;

/// Increment applied on every `slow_down`, in seconds.
pub const SLOW_DOWN_INCREMENT: u64 = 5;

/// One token request of a polling flow.
#[async_trait]
pub trait TokenPoll {
    type Output: Send;

    async fn poll_token(&self) -> Result<Self::Output, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollingState {
    Pending,
    Succeeded,
    /// Terminal failure, returned again on every later poll.
    Failed(OAuth2Error),
}

/// Drives a [`TokenPoll`] under the server dictated interval until a terminal outcome.
///
/// A job is bound to a single device or backchannel authorization and is not reusable.
#[derive(Debug)]
pub struct PollingJob<T> {
    target: T,
    interval: Duration,
    slow_down_interval: Duration,
    expires_at: Option<DateTime<Utc>>,
    state: PollingState,
}

impl<T: TokenPoll> PollingJob<T> {
    /// `interval` in seconds, [`DEFAULT_INTERVAL`] when `None`.
    pub fn new(target: T, interval: Option<u64>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            target,
            interval: Duration::from_secs(interval.unwrap_or(DEFAULT_INTERVAL)),
            slow_down_interval: Duration::from_secs(SLOW_DOWN_INCREMENT),
            expires_at,
            state: PollingState::Pending,
        }
    }

    pub fn with_slow_down_interval(mut self, slow_down_interval: Duration) -> Self {
        self.slow_down_interval = slow_down_interval;
        self
    }

    /// The wait before the next request.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn state(&self) -> &PollingState {
        &self.state
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    fn slow_down(&mut self) {
        self.interval = self.interval.saturating_add(self.slow_down_interval);
    }

    fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |expires| Utc::now() >= expires)
    }

    /// Waits one interval then issues one token request.
    ///
    /// `Ok(None)` means the authorization is still pending. `expired_token` and `access_denied`
    /// are terminal: they are returned by this and every later call without a new request.
    /// Any other error is returned as is and leaves the job pending.
    pub async fn poll(&mut self) -> Result<Option<T::Output>, ClientError> {
        match self.state {
            PollingState::Pending => {}
            PollingState::Succeeded => return Err(ClientError::PollingCompleted),
            PollingState::Failed(ref err) => return Err(err.clone().into()),
        }

        if self.is_expired() {
            let err = OAuth2Error::new(OAuth2ErrorCode::ExpiredToken)
                .with_description("the authorization request expired before it was approved");
            debug!("polling expired locally");
            self.state = PollingState::Failed(err.clone());
            return Err(err.into());
        }

        tokio::time::sleep(self.interval).await;

        match self.target.poll_token().await {
            Ok(token) => {
                debug!("polling succeeded");
                self.state = PollingState::Succeeded;
                Ok(Some(token))
            }
            Err(ClientError::OAuth2(err)) => match err.error {
                OAuth2ErrorCode::AuthorizationPending => Ok(None),
                OAuth2ErrorCode::SlowDown => {
                    self.slow_down();
                    debug!("slow_down, polling interval is now {:?}", self.interval);
                    Ok(None)
                }
                OAuth2ErrorCode::ExpiredToken | OAuth2ErrorCode::AccessDenied => {
                    debug!("polling failed: {}", err);
                    self.state = PollingState::Failed(err.clone());
                    Err(err.into())
                }
                _ => Err(err.into()),
            },
            Err(err) => Err(err),
        }
    }

    /// Polls until a token is delivered or an error is returned.
    pub async fn wait(&mut self) -> Result<T::Output, ClientError> {
        loop {
            if let Some(token) = self.poll().await? {
                return Ok(token);
            }
        }
    }
}
