use crate::{Bearer, IdToken};
use biscuit::CompactJson;

/// A token endpoint result. Has an access_token for bearer, and the id_token for authentication
/// when the grant was an OpenID Connect one.
pub struct Token<C> {
    pub bearer: Bearer,
    pub id_token: Option<IdToken<C>>,
}

impl<C: CompactJson> Token<C> {
    /// Wraps `bearer`, carrying its `id_token` only when `openid` is true.
    pub fn new(bearer: Bearer, openid: bool) -> Self {
        let id_token = if openid {
            bearer.id_token().map(IdToken::new_encoded)
        } else {
            None
        };
        Self { bearer, id_token }
    }

    /// Whether this token carries an ID token.
    pub fn is_openid(&self) -> bool {
        self.id_token.is_some()
    }
}

impl<C: CompactJson> From<Bearer> for Token<C> {
    fn from(bearer: Bearer) -> Self {
        Self::new(bearer, true)
    }
}

impl<C> std::fmt::Debug for Token<C>
where
    C: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("bearer", &self.bearer)
            .field("id_token", &self.id_token)
            .finish()
    }
}
