/*!
OAuth 2.0 Token Exchange.

See [RFC 8693](https://tools.ietf.org/html/rfc8693).
*/
use crate::error::ClientError;
use crate::{Bearer, IdToken, Params};
use biscuit::jws::Compact;
use std::str::FromStr;

pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// Token type identifiers, [RFC 8693, section 3](https://tools.ietf.org/html/rfc8693#section-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    AccessToken,
    RefreshToken,
    IdToken,
    Saml1,
    Saml2,
    Jwt,
}

impl TokenType {
    pub fn as_urn(&self) -> &'static str {
        match self {
            TokenType::AccessToken => "urn:ietf:params:oauth:token-type:access_token",
            TokenType::RefreshToken => "urn:ietf:params:oauth:token-type:refresh_token",
            TokenType::IdToken => "urn:ietf:params:oauth:token-type:id_token",
            TokenType::Saml1 => "urn:ietf:params:oauth:token-type:saml1",
            TokenType::Saml2 => "urn:ietf:params:oauth:token-type:saml2",
            TokenType::Jwt => "urn:ietf:params:oauth:token-type:jwt",
        }
    }

    const ALL: [TokenType; 6] = [
        TokenType::AccessToken,
        TokenType::RefreshToken,
        TokenType::IdToken,
        TokenType::Saml1,
        TokenType::Saml2,
        TokenType::Jwt,
    ];
}

impl FromStr for TokenType {
    type Err = ClientError;

    /// Accepts the short alias (`access_token`, ...) or the full URN.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access_token" => Ok(TokenType::AccessToken),
            "refresh_token" => Ok(TokenType::RefreshToken),
            "id_token" => Ok(TokenType::IdToken),
            "saml1" => Ok(TokenType::Saml1),
            "saml2" => Ok(TokenType::Saml2),
            "jwt" => Ok(TokenType::Jwt),
            s => TokenType::ALL
                .into_iter()
                .find(|t| t.as_urn() == s)
                .ok_or_else(|| ClientError::InvalidArgument(format!("unknown token type: {}", s))),
        }
    }
}

/// Resolves a token type argument to the identifier sent on the wire.
///
/// Known aliases map to their URN; any other absolute URI is passed through unchanged.
pub fn resolve_token_type(token_type: &str) -> Result<String, ClientError> {
    match TokenType::from_str(token_type) {
        Ok(t) => Ok(t.as_urn().to_string()),
        Err(_) if token_type.contains(':') => Ok(token_type.to_string()),
        Err(err) => Err(err),
    }
}

/// A subject or actor token, either raw or with a known kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeToken {
    /// A token of unknown kind, the type must be given explicitly.
    Raw(String),
    /// A token whose kind is known.
    Typed(TokenType, String),
}

impl ExchangeToken {
    pub fn access_token(token: impl Into<String>) -> Self {
        ExchangeToken::Typed(TokenType::AccessToken, token.into())
    }

    pub fn refresh_token(token: impl Into<String>) -> Self {
        ExchangeToken::Typed(TokenType::RefreshToken, token.into())
    }

    pub fn id_token(token: impl Into<String>) -> Self {
        ExchangeToken::Typed(TokenType::IdToken, token.into())
    }

    pub fn value(&self) -> &str {
        match self {
            ExchangeToken::Raw(token) | ExchangeToken::Typed(_, token) => token,
        }
    }

    /// The token type identifier. An explicit type always wins over the inferred kind.
    pub fn resolve_type(&self, explicit: Option<&str>) -> Result<String, ClientError> {
        match (explicit, self) {
            (Some(explicit), _) => resolve_token_type(explicit),
            (None, ExchangeToken::Typed(kind, _)) => Ok(kind.as_urn().to_string()),
            (None, ExchangeToken::Raw(_)) => Err(ClientError::InvalidArgument(
                "token type is required for a raw token".to_string(),
            )),
        }
    }
}

impl From<&str> for ExchangeToken {
    fn from(token: &str) -> Self {
        ExchangeToken::Raw(token.to_string())
    }
}

impl From<String> for ExchangeToken {
    fn from(token: String) -> Self {
        ExchangeToken::Raw(token)
    }
}

impl From<&Bearer> for ExchangeToken {
    fn from(bearer: &Bearer) -> Self {
        ExchangeToken::access_token(bearer.access_token())
    }
}

/// Only a still encoded ID token can be sent, a decoded one has lost its serialization.
impl<C> TryFrom<&IdToken<C>> for ExchangeToken {
    type Error = ClientError;

    fn try_from(id_token: &IdToken<C>) -> Result<Self, Self::Error> {
        match id_token {
            Compact::Encoded(compact) => Ok(ExchangeToken::id_token(compact.encode())),
            Compact::Decoded { .. } => Err(ClientError::InvalidArgument(
                "a decoded ID token can not be exchanged, use the raw token".to_string(),
            )),
        }
    }
}

/// A token exchange request, [RFC 8693, section 2.1](https://tools.ietf.org/html/rfc8693#section-2.1).
#[derive(Debug, Clone)]
pub struct TokenExchange {
    subject_token: ExchangeToken,
    subject_token_type: Option<String>,
    actor_token: Option<ExchangeToken>,
    actor_token_type: Option<String>,
    requested_token_type: Option<String>,
    audience: Option<String>,
    resource: Option<String>,
    scope: Option<String>,
}

impl TokenExchange {
    pub fn new(subject_token: impl Into<ExchangeToken>) -> Self {
        Self {
            subject_token: subject_token.into(),
            subject_token_type: None,
            actor_token: None,
            actor_token_type: None,
            requested_token_type: None,
            audience: None,
            resource: None,
            scope: None,
        }
    }

    pub fn subject_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.subject_token_type = Some(token_type.into());
        self
    }

    pub fn actor_token(mut self, actor_token: impl Into<ExchangeToken>) -> Self {
        self.actor_token = Some(actor_token.into());
        self
    }

    pub fn actor_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.actor_token_type = Some(token_type.into());
        self
    }

    pub fn requested_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.requested_token_type = Some(token_type.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Grant specific form parameters.
    pub(crate) fn params(&self) -> Result<Params, ClientError> {
        let mut params = Params::new()
            .with("subject_token", self.subject_token.value())
            .with(
                "subject_token_type",
                self.subject_token
                    .resolve_type(self.subject_token_type.as_deref())?,
            );
        match self.actor_token {
            Some(ref actor) => {
                params.set("actor_token", actor.value());
                params.set(
                    "actor_token_type",
                    actor.resolve_type(self.actor_token_type.as_deref())?,
                );
            }
            None if self.actor_token_type.is_some() => {
                return Err(ClientError::InvalidArgument(
                    "actor_token_type given without actor_token".to_string(),
                ))
            }
            None => {}
        }
        if let Some(ref requested) = self.requested_token_type {
            params.set("requested_token_type", resolve_token_type(requested)?);
        }
        params.set_opt("audience", self.audience.as_deref());
        params.set_opt("resource", self.resource.as_deref());
        params.set_opt("scope", self.scope.as_deref());
        Ok(params)
    }
}
