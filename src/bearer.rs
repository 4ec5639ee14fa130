use crate::deserializers::{expires_in_to_instant, lifetime_to_instant};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// The bearer token type.
///
/// The absolute expiry is computed once, when the token is constructed or deserialized from a
/// token endpoint response. Remaining lifetime is always derived from the current clock.
///
/// See [RFC 6750](http://tools.ietf.org/html/rfc6750).
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct Bearer {
    access_token: String,
    token_type: String,
    #[serde(
        default,
        rename = "expires_in",
        deserialize_with = "expires_in_to_instant"
    )]
    expires: Option<DateTime<Utc>>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Bearer {
    /// Creates a `Bearer` token. `expires_in` is relative to now; `None` or `0` never expires.
    pub fn new(access_token: impl Into<String>, expires_in: impl Into<Option<u64>>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires: lifetime_to_instant(expires_in.into()),
            refresh_token: None,
            scope: None,
            id_token: None,
            extra: Map::new(),
        }
    }

    /// Replaces the absolute expiry instant.
    pub fn with_expires_at(mut self, expires: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.expires = expires.into();
        self
    }

    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<Option<String>>) -> Self {
        self.refresh_token = refresh_token.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<Option<String>>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_id_token(mut self, id_token: impl Into<Option<String>>) -> Self {
        self.id_token = id_token.into();
        self
    }

    /// Adds a vendor specific claim.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// The raw, still encoded, ID token.
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    /// Vendor specific claims returned alongside the standard ones.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Whether the scope, as returned by the server, contains `scope`.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope
            .as_deref()
            .map_or(false, |s| s.split_whitespace().any(|s| s == scope))
    }

    /// Seconds left until expiry, computed from the current clock on every call.
    pub fn expires_in(&self) -> Option<i64> {
        self.expires_in_at(Utc::now())
    }

    fn expires_in_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires.map(|expires| {
            let left = expires - now;
            // round up like the server did when it issued the lifetime
            let seconds = left.num_seconds();
            if left > Duration::seconds(seconds) {
                seconds + 1
            } else {
                seconds
            }
        })
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_with_leeway(Duration::zero())
    }

    /// Expired if the token expires within `leeway` from now.
    pub fn is_expired_with_leeway(&self, leeway: Duration) -> bool {
        self.is_expired_at(Utc::now(), leeway)
    }

    /// Checks expiry against an arbitrary clock reading.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        match self.expires {
            Some(expires) => now + leeway > expires,
            None => false,
        }
    }

    /// Value for an `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Looks up a standard field or a vendor specific claim by its wire name.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "access_token" => Some(Value::from(self.access_token.as_str())),
            "token_type" => Some(Value::from(self.token_type.as_str())),
            "expires_in" => self.expires_in().map(Value::from),
            "expires_at" => self.expires.map(|e| Value::from(e.timestamp())),
            "refresh_token" => self.refresh_token.as_deref().map(Value::from),
            "scope" => self.scope.as_deref().map(Value::from),
            "id_token" => self.id_token.as_deref().map(Value::from),
            key => self.extra.get(key).cloned(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// JSON rendering. With `expires_at` the absolute expiry is written as a UNIX timestamp,
    /// otherwise the live `expires_in`.
    pub fn as_json(&self, expires_at: bool) -> Map<String, Value> {
        let mut json = self.extra.clone();
        json.insert("access_token".into(), self.access_token.clone().into());
        json.insert("token_type".into(), self.token_type.clone().into());
        if expires_at {
            if let Some(expires) = self.expires {
                json.insert("expires_at".into(), expires.timestamp().into());
            }
        } else if let Some(expires_in) = self.expires_in() {
            json.insert("expires_in".into(), expires_in.into());
        }
        if let Some(ref refresh_token) = self.refresh_token {
            json.insert("refresh_token".into(), refresh_token.clone().into());
        }
        if let Some(ref scope) = self.scope {
            json.insert("scope".into(), scope.clone().into());
        }
        if let Some(ref id_token) = self.id_token {
            json.insert("id_token".into(), id_token.clone().into());
        }
        json
    }
}

impl fmt::Display for Bearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.access_token)
    }
}

impl fmt::Debug for Bearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bearer")
            .field("access_token", &self.access_token)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in())
            .field("refresh_token", &self.refresh_token)
            .field("scope", &self.scope)
            .field("id_token", &self.id_token)
            .field("extra", &self.extra)
            .finish()
    }
}
