/*!
# OAuth 2.x & OpenID Connect client library using async / await

## Legal

Dual-licensed under `MIT` or the [UNLICENSE](http://unlicense.org/).

## Features

Client side of the [OAuth 2.0](https://tools.ietf.org/html/rfc6749) token endpoint and its
companions:

- grants: client credentials, authorization code (with [PKCE](https://tools.ietf.org/html/rfc7636)),
  refresh token, [device code](https://tools.ietf.org/html/rfc8628),
  [CIBA](https://openid.net/specs/openid-client-initiated-backchannel-authentication-core-1_0.html)
  in poll mode and [token exchange](https://tools.ietf.org/html/rfc8693);
- [revocation](https://tools.ietf.org/html/rfc7009), [introspection](https://tools.ietf.org/html/rfc7662)
  and userinfo;
- client authentication with `client_secret_basic`, `client_secret_post`, `client_secret_jwt`,
  `private_key_jwt` or none for public clients;
- [OpenID Connect Discovery 1.0](https://openid.net/specs/openid-connect-discovery-1_0.html) and
  ID token verification.

Using [reqwest](https://crates.io/crates/reqwest) for the HTTP client and [biscuit](https://crates.io/crates/biscuit) for Javascript Object Signing and Encryption (JOSE).

## Usage

Add dependency to Cargo.toml:

```toml
[dependencies]
oauth2client = "0.1"
```

### Authorization code flow

```rust,no_run
use oauth2client::{ClientAuthentication, DiscoveredClient};
use url::Url;

# async fn run() -> Result<(), oauth2client::error::Error> {
let issuer = Url::parse("https://accounts.example.com")?;
let client = DiscoveredClient::discover(
    ClientAuthentication::basic("CLIENT_ID", "CLIENT_SECRET"),
    Some("https://app.example.com/callback".to_string()),
    issuer,
)
.await?;

let request = client
    .authorization_request("openid email")?
    .build()?;
// Keep `request` in the user session and redirect the user agent to `request.uri()`.
println!("{}", request.uri());

// Back on the redirect URI:
let callback = "https://app.example.com/callback?code=...&state=...";
let token = client.authenticate(&request, callback, None).await?;
if let Some(id_token) = token.id_token {
    println!("{:?}", id_token.payload()?);
}
# Ok(())
# }
```

### Device authorization

```rust,no_run
use oauth2client::{Client, ClientAuthentication, Endpoints, Params, StandardClaims};
use url::Url;

# async fn run() -> Result<(), oauth2client::error::Error> {
let mut endpoints = Endpoints::new(Url::parse("https://as.example.com/token")?);
endpoints.device_authorization_endpoint = Some(Url::parse("https://as.example.com/device")?);
let client: Client<_, StandardClaims> = Client::new(
    endpoints,
    ClientAuthentication::public("CLIENT_ID"),
    None,
    reqwest::Client::new(),
    None,
);

let device = client.authorize_device(Some("profile"), Params::new()).await?;
println!("visit {} and enter {}", device.verification_uri, device.user_code);
let token = client.device_authorization_job(&device).wait().await?;
println!("{}", token.bearer);
# Ok(())
# }
```
*/
mod authorization_request;
mod backchannel;
mod bearer;
mod claims;
mod client;
mod client_auth;
mod config;
mod deserializers;
mod device_authorization;
mod discovered;
pub mod error;
mod params;
pub mod pkce;
mod polling;
pub mod provider;
mod random;
mod standard_claims;
mod token;
mod token_exchange;
mod token_serializer;
mod validation;

pub use ::biscuit::jws::Compact as Jws;
pub use ::biscuit::{Compact, CompactJson, Empty, SingleOrMultiple};
pub use authorization_request::{AuthorizationRequest, AuthorizationRequestBuilder};
pub use backchannel::{
    AuthenticationHint, BackChannelAuthentication, BackChannelAuthenticationPollingJob,
    BackChannelAuthenticationResponse, BackChannelPoll, GRANT_TYPE_CIBA,
};
pub use bearer::Bearer;
pub use claims::Claims;
pub use client::Client;
pub use client_auth::{ClientAuthentication, Credentials, CLIENT_ASSERTION_TYPE};
pub use config::Config;
pub use device_authorization::{
    DeviceAuthorizationPollingJob, DeviceAuthorizationResponse, DeviceCodePoll,
    GRANT_TYPE_DEVICE_CODE,
};
pub use discovered::Discovered;
pub use error::{ClientError, OAuth2Error, OAuth2ErrorCode};
pub use params::Params;
pub use pkce::{CodeChallengeMethod, Pkce};
pub use polling::{PollingJob, PollingState, TokenPoll, DEFAULT_INTERVAL, SLOW_DOWN_INCREMENT};
pub use provider::{Endpoints, Provider};
pub use standard_claims::StandardClaims;
pub use token::Token;
pub use token_exchange::{
    resolve_token_type, ExchangeToken, TokenExchange, TokenType, GRANT_TYPE_TOKEN_EXCHANGE,
};
pub use token_serializer::{Dumper, Loader, TokenSerializer};
pub use validation::{
    validate_state, validate_token_aud, validate_token_exp, validate_token_issuer,
    validate_token_nonce,
};

/// Reimport `biscuit` dependency.
pub mod biscuit {
    pub use biscuit::*;
}

pub type IdToken<T> = Jws<T, Empty>;
pub type DiscoveredClient = Client<Discovered, StandardClaims>;
