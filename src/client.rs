use crate::authorization_request::{AuthorizationRequest, AuthorizationRequestBuilder};
use crate::backchannel::{
    BackChannelAuthentication, BackChannelAuthenticationPollingJob,
    BackChannelAuthenticationResponse, GRANT_TYPE_CIBA,
};
use crate::device_authorization::{
    DeviceAuthorizationPollingJob, DeviceAuthorizationResponse, GRANT_TYPE_DEVICE_CODE,
};
use crate::discovered;
use crate::error::{ClientError, Decode, Error, OAuth2Error};
use crate::token_exchange::{TokenExchange, GRANT_TYPE_TOKEN_EXCHANGE};
use crate::validation::{
    validate_token_aud, validate_token_exp, validate_token_issuer, validate_token_nonce,
};
use crate::{
    Bearer, Claims, ClientAuthentication, Config, Discovered, IdToken, Params, Provider,
    StandardClaims, Token,
};
use biscuit::jwa::SignatureAlgorithm;
use biscuit::jwk::JWKSet;
use biscuit::jws::Compact;
use biscuit::{CompactJson, Empty};
use chrono::Duration;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use url::Url;

/// Parameters set by the client that caller extras never override.
const PROTECTED: &[&str] = &["grant_type", "client_id"];

/// OAuth 2.0 / OpenID Connect client.
#[derive(Debug)]
pub struct Client<P = Discovered, C = StandardClaims> {
    /// OAuth provider.
    pub provider: P,

    /// Client authentication method and credentials.
    pub auth: ClientAuthentication,

    /// Redirect URI.
    pub redirect_uri: Option<String>,

    pub http_client: reqwest::Client,

    /// Keys ID tokens are verified with.
    pub jwks: Option<JWKSet<Empty>>,

    marker: PhantomData<C>,
}

impl<C> Client<Discovered, C> {
    /// Constructs a client from an issuer url and client parameters via discovery
    pub async fn discover(
        auth: ClientAuthentication,
        redirect_uri: Option<String>,
        issuer: Url,
    ) -> Result<Self, Error> {
        Self::discover_with_client(reqwest::Client::new(), auth, redirect_uri, issuer).await
    }

    /// Discovery using the given HTTP client.
    pub async fn discover_with_client(
        http_client: reqwest::Client,
        auth: ClientAuthentication,
        redirect_uri: Option<String>,
        issuer: Url,
    ) -> Result<Self, Error> {
        let config = discovered::discover(&http_client, issuer).await?;
        let jwks = match config.jwks_uri {
            Some(ref url) => Some(discovered::jwks(&http_client, url.clone()).await?),
            None => None,
        };
        let provider = Discovered(config);
        Ok(Self::new(provider, auth, redirect_uri, http_client, jwks))
    }

    /// A reference to the config document of the provider obtained via discovery
    pub fn config(&self) -> &Config {
        &self.provider.0
    }
}

impl<P, C> Client<P, C> {
    /// Creates a client.
    ///
    /// # Examples
    ///
    /// ```
    /// use oauth2client::{Client, ClientAuthentication, Endpoints, StandardClaims};
    /// use url::Url;
    ///
    /// let endpoints = Endpoints::new(Url::parse("https://as.example.com/token").unwrap());
    /// let client: Client<_, StandardClaims> = Client::new(
    ///     endpoints,
    ///     ClientAuthentication::basic("CLIENT_ID", "CLIENT_SECRET"),
    ///     None,
    ///     reqwest::Client::new(),
    ///     None,
    /// );
    /// ```
    pub fn new(
        provider: P,
        auth: ClientAuthentication,
        redirect_uri: Option<String>,
        http_client: reqwest::Client,
        jwks: Option<JWKSet<Empty>>,
    ) -> Self {
        Client {
            provider,
            auth,
            redirect_uri,
            http_client,
            jwks,
            marker: PhantomData,
        }
    }

    pub fn client_id(&self) -> &str {
        self.auth.client_id()
    }
}

impl<P, C> Client<P, C>
where
    P: Provider,
    C: CompactJson,
{
    /// Starts an authorization request against the provider's authorization endpoint,
    /// with this client's id and redirect URI.
    pub fn authorization_request(
        &self,
        scope: impl Into<String>,
    ) -> Result<AuthorizationRequestBuilder, ClientError> {
        let endpoint = self
            .provider
            .auth_uri()
            .ok_or(ClientError::MissingEndpoint("authorization endpoint"))?;
        let mut builder =
            AuthorizationRequest::builder(endpoint.clone(), self.client_id()).scope(scope);
        if let Some(ref redirect_uri) = self.redirect_uri {
            builder = builder.redirect_uri(redirect_uri.as_str());
        }
        Ok(builder)
    }

    async fn post_form(
        &self,
        url: &Url,
        mut params: Params,
        extra: Params,
    ) -> Result<(StatusCode, String), ClientError> {
        params.merge(extra, PROTECTED);
        let credentials = self.auth.prepare(url)?;
        for (key, value) in credentials.fields {
            params.set(key, value);
        }

        let mut request = self
            .http_client
            .post(url.clone())
            .header(ACCEPT, mime::APPLICATION_JSON.as_ref())
            .header(CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
            .body(params.to_form());
        if let Some(authorization) = credentials.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Sends a token request: `grant_type`, the grant specific `params`, then caller `extra`
    /// parameters, authenticated with the client credentials.
    ///
    /// See [RFC 6749, section 5](http://tools.ietf.org/html/rfc6749#section-5).
    pub async fn token_request(
        &self,
        grant_type: &str,
        params: Params,
        extra: Params,
    ) -> Result<Bearer, ClientError> {
        let url = self.provider.token_uri();
        let mut form = Params::new().with("grant_type", grant_type);
        form.merge(params, &[]);
        debug!("token request '{}' to {}", grant_type, url);
        let (status, body) = self.post_form(url, form, extra).await?;
        parse_response(url, status, body)
    }

    /// Requests an access token for the client itself.
    ///
    /// See [RFC 6749, section 4.4](http://tools.ietf.org/html/rfc6749#section-4.4).
    pub async fn client_credentials(
        &self,
        scope: Option<&str>,
        extra: Params,
    ) -> Result<Token<C>, ClientError> {
        let mut params = Params::new();
        params.set_opt("scope", scope);
        let bearer = self
            .token_request("client_credentials", params, extra)
            .await?;
        Ok(promote(bearer, scope))
    }

    /// Requests an access token using an authorization code.
    ///
    /// See [RFC 6749, section 4.1.3](http://tools.ietf.org/html/rfc6749#section-4.1.3).
    pub async fn authorization_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
        extra: Params,
    ) -> Result<Token<C>, ClientError> {
        self.exchange_code(
            code,
            self.redirect_uri.as_deref(),
            code_verifier,
            None,
            extra,
        )
        .await
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
        requested_scope: Option<&str>,
        extra: Params,
    ) -> Result<Token<C>, ClientError> {
        let mut params = Params::new().with("code", code);
        params.set_opt("redirect_uri", redirect_uri);
        params.set_opt("code_verifier", code_verifier);
        let bearer = self
            .token_request("authorization_code", params, extra)
            .await?;
        Ok(promote(bearer, requested_scope))
    }

    /// Refreshes an access token. The given token is left untouched; the new one keeps the
    /// previous refresh token when the server does not rotate it.
    ///
    /// See [RFC 6749, section 6](http://tools.ietf.org/html/rfc6749#section-6).
    pub async fn refresh_token(
        &self,
        token: &Bearer,
        scope: Option<&str>,
        extra: Params,
    ) -> Result<Token<C>, ClientError> {
        let refresh_token = token
            .refresh_token()
            .ok_or_else(|| ClientError::InvalidArgument("token has no refresh_token".into()))?;
        let mut params = Params::new().with("refresh_token", refresh_token);
        params.set_opt("scope", scope);
        let bearer = self.token_request("refresh_token", params, extra).await?;
        let bearer = if bearer.refresh_token().is_some() {
            bearer
        } else {
            bearer.with_refresh_token(refresh_token.to_string())
        };
        Ok(promote(bearer, scope.or(token.scope())))
    }

    /// Ensures an access token is valid by refreshing it if necessary.
    pub async fn ensure_token(&self, token: Bearer) -> Result<Bearer, ClientError> {
        if token.is_expired() {
            Ok(self.refresh_token(&token, None, Params::new()).await?.bearer)
        } else {
            Ok(token)
        }
    }

    /// One device access token request. `scope` is the one the device authorization was
    /// requested with.
    ///
    /// See [RFC 8628, section 3.4](https://tools.ietf.org/html/rfc8628#section-3.4).
    pub async fn device_code(
        &self,
        device_code: &str,
        scope: Option<&str>,
        extra: Params,
    ) -> Result<Token<C>, ClientError> {
        let params = Params::new().with("device_code", device_code);
        let bearer = self
            .token_request(GRANT_TYPE_DEVICE_CODE, params, extra)
            .await?;
        Ok(promote(bearer, scope))
    }

    /// One CIBA token request in poll mode.
    ///
    /// See [CIBA, section 10.1](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html#token_request).
    pub async fn ciba(&self, auth_req_id: &str, extra: Params) -> Result<Token<C>, ClientError> {
        let params = Params::new().with("auth_req_id", auth_req_id);
        let bearer = self.token_request(GRANT_TYPE_CIBA, params, extra).await?;
        Ok(promote(bearer, Some("openid")))
    }

    /// Exchanges a token for another one.
    ///
    /// See [RFC 8693, section 2](https://tools.ietf.org/html/rfc8693#section-2).
    pub async fn token_exchange(
        &self,
        request: &TokenExchange,
        extra: Params,
    ) -> Result<Token<C>, ClientError> {
        let params = request.params()?;
        let bearer = self
            .token_request(GRANT_TYPE_TOKEN_EXCHANGE, params, extra)
            .await?;
        Ok(promote(bearer, None))
    }

    /// Starts a device authorization.
    ///
    /// See [RFC 8628, section 3.1](https://tools.ietf.org/html/rfc8628#section-3.1).
    pub async fn authorize_device(
        &self,
        scope: Option<&str>,
        extra: Params,
    ) -> Result<DeviceAuthorizationResponse, ClientError> {
        let url = self
            .provider
            .device_authorization_uri()
            .ok_or(ClientError::MissingEndpoint("device authorization endpoint"))?;
        let mut params = Params::new();
        params.set_opt("scope", scope);
        debug!("device authorization request to {}", url);
        let (status, body) = self.post_form(url, params, extra).await?;
        let mut response: DeviceAuthorizationResponse = parse_response(url, status, body)?;
        response.scope = scope.map(str::to_string);
        Ok(response)
    }

    /// Starts a backchannel authentication.
    ///
    /// See [CIBA, section 7](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html#auth_backchannel_endpoint).
    pub async fn backchannel_authentication_request(
        &self,
        request: &BackChannelAuthentication,
        extra: Params,
    ) -> Result<BackChannelAuthenticationResponse, ClientError> {
        let url = self
            .provider
            .backchannel_authentication_uri()
            .ok_or(ClientError::MissingEndpoint(
                "backchannel authentication endpoint",
            ))?;
        let params = request.params()?;
        debug!("backchannel authentication request to {}", url);
        let (status, body) = self.post_form(url, params, extra).await?;
        parse_response(url, status, body)
    }

    /// Revokes a token. Returns `false` when the server refused without a standard error.
    ///
    /// See [RFC 7009](https://tools.ietf.org/html/rfc7009#section-2).
    pub async fn revoke_token(
        &self,
        token: &str,
        token_type_hint: Option<&str>,
        extra: Params,
    ) -> Result<bool, ClientError> {
        let url = self
            .provider
            .revocation_uri()
            .ok_or(ClientError::MissingEndpoint("revocation endpoint"))?;
        let mut params = Params::new().with("token", token);
        params.set_opt("token_type_hint", token_type_hint);
        debug!("revocation request to {}", url);
        let (status, body) = self.post_form(url, params, extra).await?;

        let error = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(oauth2_error);
        match error {
            Some(error) => Err(error.into()),
            None if status.is_success() => Ok(true),
            None => {
                warn!("revocation at {} failed with HTTP {}", url, status);
                Ok(false)
            }
        }
    }

    pub async fn revoke_access_token(&self, token: &Bearer) -> Result<bool, ClientError> {
        self.revoke_token(token.access_token(), Some("access_token"), Params::new())
            .await
    }

    pub async fn revoke_refresh_token(&self, token: &Bearer) -> Result<bool, ClientError> {
        let refresh_token = token
            .refresh_token()
            .ok_or_else(|| ClientError::InvalidArgument("token has no refresh_token".into()))?;
        self.revoke_token(refresh_token, Some("refresh_token"), Params::new())
            .await
    }

    /// Introspects a token. The response is returned as is.
    ///
    /// See [RFC 7662](https://tools.ietf.org/html/rfc7662#section-2).
    pub async fn introspect_token(
        &self,
        token: &str,
        token_type_hint: Option<&str>,
        extra: Params,
    ) -> Result<Map<String, Value>, ClientError> {
        let url = self
            .provider
            .introspection_uri()
            .ok_or(ClientError::MissingEndpoint("introspection endpoint"))?;
        let mut params = Params::new().with("token", token);
        params.set_opt("token_type_hint", token_type_hint);
        debug!("introspection request to {}", url);
        let (status, body) = self.post_form(url, params, extra).await?;
        parse_response(url, status, body)
    }

    /// Get a userinfo json document for a given token at the provider's userinfo endpoint.
    pub async fn userinfo(&self, token: &Bearer) -> Result<Map<String, Value>, ClientError> {
        let url = self
            .provider
            .userinfo_uri()
            .ok_or(ClientError::MissingEndpoint("userinfo endpoint"))?;
        let response = self
            .http_client
            .get(url.clone())
            .header(ACCEPT, mime::APPLICATION_JSON.as_ref())
            .header(AUTHORIZATION, token.authorization_header())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        parse_response(url, status, body)
    }
}

impl<P, C> Client<P, C>
where
    P: Provider,
    C: CompactJson + Claims,
{
    /// Validates the authorization callback, redeems the code with the request's
    /// `redirect_uri` and code verifier, then decodes and validates the returned ID token.
    ///
    /// An ID token can only be accepted by a client holding a key set, otherwise
    /// `Decode::NoKeySet` is returned.
    pub async fn authenticate(
        &self,
        request: &AuthorizationRequest,
        callback: &str,
        max_age: Option<&Duration>,
    ) -> Result<Token<C>, Error> {
        let code = request.validate_callback(callback)?;
        let redirect_uri = request
            .redirect_uri()
            .or(self.redirect_uri.as_deref());
        let mut token = self
            .exchange_code(
                &code,
                redirect_uri,
                request.code_verifier(),
                request.scope(),
                Params::new(),
            )
            .await?;
        if let Some(id_token) = token.id_token.as_mut() {
            self.decode_token(id_token)?;
            self.validate_token(id_token, Some(request.nonce()), max_age)?;
        }
        Ok(token)
    }

    /// Mutates a Compact::encoded Token to Compact::decoded. Errors are:
    ///
    /// - Decode::NoKeySet if the client has no key set
    /// - Decode::EmptySet if the keyset is empty
    /// - Decode::MissingKid if the keyset has multiple keys but the key id on the token is missing
    /// - Decode::MissingKey if the given key id is not in the key set
    /// - Decode::UnsupportedKey if the token is not signed
    /// - Jose error if decoding or signature verification fails
    pub fn decode_token(&self, token: &mut IdToken<C>) -> Result<(), Error> {
        // This is an early return if the token is already decoded
        if let Compact::Decoded { .. } = *token {
            return Ok(());
        }

        let jwks = self.jwks.as_ref().ok_or(Decode::NoKeySet)?;
        if jwks.keys.is_empty() {
            return Err(Decode::EmptySet.into());
        }

        let header = token.unverified_header()?;
        let alg = header.registered.algorithm;
        if alg == SignatureAlgorithm::None {
            return Err(Decode::UnsupportedKey("none".to_string()).into());
        }

        let decoded = match header.registered.key_id {
            Some(ref kid) => {
                if jwks.find(kid).is_none() {
                    return Err(Decode::MissingKey(kid.clone()).into());
                }
                token.decode_with_jwks(jwks, Some(alg))?
            }
            // If there is more than one key, the token MUST have a key id
            None if jwks.keys.len() > 1 => return Err(Decode::MissingKid.into()),
            None => token.decode_with_jwks_ignore_kid(jwks)?,
        };
        *token = decoded;
        Ok(())
    }

    /// Validate a decoded token. If you don't get an error, its valid! Nonce and max_age come from
    /// your authorization request. Errors are:
    ///
    /// - Jose Error if the Token isn't decoded
    /// - Validation::Mismatch::Issuer if the provider issuer and token issuer mismatch
    /// - Validation::Mismatch::Nonce if a given nonce and the token nonce mismatch
    /// - Validation::Missing::Nonce if either the token or args has a nonce and the other does not
    /// - Validation::Missing::Audience if the token aud doesn't contain the client id
    /// - Validation::Missing::AuthorizedParty if there are multiple audiences and azp is missing
    /// - Validation::Mismatch::AuthorizedParty if the azp is not the client_id
    /// - Validation::Expired::Expires if the current time is past the expiration time
    /// - Validation::Expired::MaxAge is the token is older than the provided max_age
    /// - Validation::Missing::Authtime if a max_age was given and the token has no auth time
    pub fn validate_token(
        &self,
        token: &IdToken<C>,
        nonce: Option<&str>,
        max_age: Option<&Duration>,
    ) -> Result<(), Error> {
        let claims = token.payload()?;

        if let Some(issuer) = self.provider.issuer() {
            validate_token_issuer(claims, issuer)?;
        }
        validate_token_nonce(claims, nonce)?;
        validate_token_aud(claims, self.client_id())?;
        validate_token_exp(claims, max_age)?;

        Ok(())
    }
}

impl<P, C> Client<P, C>
where
    P: Provider + Sync,
    C: CompactJson + Send + Sync,
{
    /// A polling job for a device authorization started with [`Client::authorize_device`].
    pub fn device_authorization_job(
        &self,
        response: &DeviceAuthorizationResponse,
    ) -> DeviceAuthorizationPollingJob<'_, P, C> {
        DeviceAuthorizationPollingJob::for_device(self, response, Params::new())
    }

    /// A polling job for a backchannel authentication started with
    /// [`Client::backchannel_authentication_request`].
    pub fn backchannel_authentication_job(
        &self,
        response: &BackChannelAuthenticationResponse,
    ) -> BackChannelAuthenticationPollingJob<'_, P, C> {
        BackChannelAuthenticationPollingJob::for_backchannel(self, response, Params::new())
    }
}

/// Carries the ID token unless the scope, as requested or as granted, excludes `openid`.
fn promote<C: CompactJson>(bearer: Bearer, requested_scope: Option<&str>) -> Token<C> {
    let openid = match requested_scope.or(bearer.scope()) {
        Some(scope) => scope.split_whitespace().any(|s| s == "openid"),
        None => true,
    };
    Token::new(bearer, openid)
}

/// A standard error body: a JSON object with a string `error` member.
fn oauth2_error(json: &Value) -> Option<OAuth2Error> {
    let code = json.get("error")?.as_str()?;
    let text = |key: &str| json.get(key).and_then(Value::as_str).map(str::to_string);
    Some(OAuth2Error {
        error: code.into(),
        error_description: text("error_description"),
        error_uri: text("error_uri"),
    })
}

/// Classifies a JSON endpoint response.
///
/// Standard error bodies become [`ClientError::OAuth2`] whatever the status; other non JSON or
/// non 2xx answers are unexpected; a 2xx body that does not fit `T` is invalid.
fn parse_response<T: DeserializeOwned>(
    url: &Url,
    status: StatusCode,
    body: String,
) -> Result<T, ClientError> {
    let json = match serde_json::from_str::<Value>(&body) {
        Ok(json) => json,
        Err(_) => return Err(unexpected(url, status, body)),
    };
    if let Some(error) = oauth2_error(&json) {
        return Err(error.into());
    }
    if !status.is_success() {
        return Err(unexpected(url, status, body));
    }
    serde_json::from_value(json).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

fn unexpected(url: &Url, status: StatusCode, body: String) -> ClientError {
    ClientError::UnexpectedResponse {
        url: url.clone(),
        status: status.as_u16(),
        body,
    }
}
