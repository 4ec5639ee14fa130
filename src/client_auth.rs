/*!
Client authentication at the token, revocation, introspection, device authorization and
backchannel authentication endpoints.

See [RFC 6749, section 2.3](https://tools.ietf.org/html/rfc6749#section-2.3),
[RFC 7523](https://tools.ietf.org/html/rfc7523) and
[OpenID Connect Core, section 9](https://openid.net/specs/openid-connect-core-1_0.html#ClientAuthentication).
*/
use crate::error::ClientError;
use base64::{engine::general_purpose::STANDARD, Engine};
use biscuit::jwa::SignatureAlgorithm;
use biscuit::jws::{Header, RegisteredHeader, Secret};
use biscuit::{ClaimsSet, Empty, RegisteredClaims, SingleOrMultiple, JWT};
use chrono::{Duration, Utc};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// `client_assertion_type` for JWT client assertions.
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Lifetime of a signed client assertion, in seconds.
const CLIENT_ASSERTION_LIFETIME: i64 = 60;

/// How the client proves its identity to the authorization server.
#[derive(Clone)]
pub enum ClientAuthentication {
    /// `client_secret_basic`: credentials in the `Authorization` header.
    ClientSecretBasic {
        client_id: String,
        client_secret: String,
    },
    /// `client_secret_post`: credentials in the request body.
    ClientSecretPost {
        client_id: String,
        client_secret: String,
    },
    /// `client_secret_jwt`: an assertion signed with HMAC keyed by the client secret.
    ClientSecretJwt {
        client_id: String,
        client_secret: String,
        algorithm: SignatureAlgorithm,
    },
    /// `private_key_jwt`: an assertion signed with a private key registered at the server.
    PrivateKeyJwt {
        client_id: String,
        private_key: Secret,
        algorithm: SignatureAlgorithm,
        key_id: Option<String>,
    },
    /// `none`: a public client, identified by its `client_id` only.
    PublicApp { client_id: String },
}

/// Credentials to attach to a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Value of the `Authorization` header, if any.
    pub authorization: Option<String>,
    /// Fields to add to the form encoded body.
    pub fields: Vec<(String, String)>,
}

impl ClientAuthentication {
    pub fn basic(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        ClientAuthentication::ClientSecretBasic {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn post(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        ClientAuthentication::ClientSecretPost {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// `client_secret_jwt` signed with HS256.
    pub fn client_secret_jwt(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        ClientAuthentication::ClientSecretJwt {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            algorithm: SignatureAlgorithm::HS256,
        }
    }

    pub fn private_key_jwt(
        client_id: impl Into<String>,
        private_key: Secret,
        algorithm: SignatureAlgorithm,
        key_id: impl Into<Option<String>>,
    ) -> Self {
        ClientAuthentication::PrivateKeyJwt {
            client_id: client_id.into(),
            private_key,
            algorithm,
            key_id: key_id.into(),
        }
    }

    pub fn public(client_id: impl Into<String>) -> Self {
        ClientAuthentication::PublicApp {
            client_id: client_id.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            ClientAuthentication::ClientSecretBasic { client_id, .. }
            | ClientAuthentication::ClientSecretPost { client_id, .. }
            | ClientAuthentication::ClientSecretJwt { client_id, .. }
            | ClientAuthentication::PrivateKeyJwt { client_id, .. }
            | ClientAuthentication::PublicApp { client_id } => client_id,
        }
    }

    /// The `token_endpoint_auth_method` name of this variant.
    pub fn method(&self) -> &'static str {
        match self {
            ClientAuthentication::ClientSecretBasic { .. } => "client_secret_basic",
            ClientAuthentication::ClientSecretPost { .. } => "client_secret_post",
            ClientAuthentication::ClientSecretJwt { .. } => "client_secret_jwt",
            ClientAuthentication::PrivateKeyJwt { .. } => "private_key_jwt",
            ClientAuthentication::PublicApp { .. } => "none",
        }
    }

    /// Produces the credentials for one request to `audience`.
    ///
    /// Signed variants mint a new assertion with a fresh `jti`, `iat` and `exp` on every call.
    pub fn prepare(&self, audience: &Url) -> Result<Credentials, ClientError> {
        let credentials = match self {
            ClientAuthentication::ClientSecretBasic {
                client_id,
                client_secret,
            } => Credentials {
                authorization: Some(format!(
                    "Basic {}",
                    STANDARD.encode(format!("{}:{}", client_id, client_secret))
                )),
                fields: Vec::new(),
            },
            ClientAuthentication::ClientSecretPost {
                client_id,
                client_secret,
            } => Credentials {
                authorization: None,
                fields: vec![
                    ("client_id".to_string(), client_id.clone()),
                    ("client_secret".to_string(), client_secret.clone()),
                ],
            },
            ClientAuthentication::ClientSecretJwt {
                client_id,
                client_secret,
                algorithm,
            } => {
                let secret = Secret::Bytes(client_secret.as_bytes().to_vec());
                let assertion = client_assertion(client_id, audience, &secret, *algorithm, None)?;
                assertion_credentials(client_id, assertion)
            }
            ClientAuthentication::PrivateKeyJwt {
                client_id,
                private_key,
                algorithm,
                key_id,
            } => {
                let assertion =
                    client_assertion(client_id, audience, private_key, *algorithm, key_id.clone())?;
                assertion_credentials(client_id, assertion)
            }
            ClientAuthentication::PublicApp { client_id } => Credentials {
                authorization: None,
                fields: vec![("client_id".to_string(), client_id.clone())],
            },
        };
        Ok(credentials)
    }
}

fn assertion_credentials(client_id: &str, assertion: String) -> Credentials {
    Credentials {
        authorization: None,
        fields: vec![
            ("client_id".to_string(), client_id.to_string()),
            ("client_assertion".to_string(), assertion),
            (
                "client_assertion_type".to_string(),
                CLIENT_ASSERTION_TYPE.to_string(),
            ),
        ],
    }
}

fn client_assertion(
    client_id: &str,
    audience: &Url,
    secret: &Secret,
    algorithm: SignatureAlgorithm,
    key_id: Option<String>,
) -> Result<String, ClientError> {
    let now = Utc::now();
    let claims = ClaimsSet::<Empty> {
        registered: RegisteredClaims {
            issuer: Some(client_id.to_string()),
            subject: Some(client_id.to_string()),
            audience: Some(SingleOrMultiple::Single(audience.to_string())),
            id: Some(Uuid::new_v4().to_string()),
            issued_at: Some(now.into()),
            expiry: Some((now + Duration::seconds(CLIENT_ASSERTION_LIFETIME)).into()),
            ..Default::default()
        },
        private: Empty {},
    };
    let header = Header::from(RegisteredHeader {
        algorithm,
        key_id,
        ..Default::default()
    });
    let jwt = JWT::new_decoded(header, claims)
        .into_encoded(secret)
        .map_err(ClientError::Assertion)?;
    let encoded = jwt.encoded().map_err(ClientError::Assertion)?;
    Ok(encoded.to_string())
}

impl fmt::Debug for ClientAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientAuthentication")
            .field("method", &self.method())
            .field("client_id", &self.client_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biscuit::ValidationOptions;

    fn token_endpoint() -> Url {
        Url::parse("https://as.example.com/token").unwrap()
    }

    fn field<'a>(credentials: &'a Credentials, name: &str) -> Option<&'a str> {
        credentials
            .fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn claims(assertion: &str, secret: &Secret, alg: SignatureAlgorithm) -> RegisteredClaims {
        let jwt: JWT<Empty, Empty> = JWT::new_encoded(assertion);
        let decoded = jwt.into_decoded(secret, alg).unwrap();
        let claims = decoded.payload().unwrap();
        claims
            .registered
            .validate(ValidationOptions::default())
            .unwrap();
        claims.registered.clone()
    }

    #[test]
    fn basic_uses_header_only() {
        let auth = ClientAuthentication::basic("client", "s3cr3t");
        let credentials = auth.prepare(&token_endpoint()).unwrap();
        assert_eq!(
            Some(format!("Basic {}", STANDARD.encode("client:s3cr3t"))),
            credentials.authorization
        );
        assert!(credentials.fields.is_empty());
    }

    #[test]
    fn post_uses_body_only() {
        let auth = ClientAuthentication::post("client", "s3cr3t");
        let credentials = auth.prepare(&token_endpoint()).unwrap();
        assert_eq!(None, credentials.authorization);
        assert_eq!(Some("client"), field(&credentials, "client_id"));
        assert_eq!(Some("s3cr3t"), field(&credentials, "client_secret"));
    }

    #[test]
    fn public_app_sends_client_id() {
        let auth = ClientAuthentication::public("client");
        let credentials = auth.prepare(&token_endpoint()).unwrap();
        assert_eq!(None, credentials.authorization);
        assert_eq!(
            vec![("client_id".to_string(), "client".to_string())],
            credentials.fields
        );
        assert_eq!("none", auth.method());
    }

    #[test]
    fn client_secret_jwt_assertion() {
        let auth = ClientAuthentication::client_secret_jwt("client", "a-long-enough-shared-secret");
        let first = auth.prepare(&token_endpoint()).unwrap();
        let second = auth.prepare(&token_endpoint()).unwrap();

        assert_eq!(None, first.authorization);
        assert_eq!(Some("client"), field(&first, "client_id"));
        assert_eq!(
            Some(CLIENT_ASSERTION_TYPE),
            field(&first, "client_assertion_type")
        );
        assert!(field(&first, "client_secret").is_none());

        let secret = Secret::Bytes(b"a-long-enough-shared-secret".to_vec());
        let a = claims(
            field(&first, "client_assertion").unwrap(),
            &secret,
            SignatureAlgorithm::HS256,
        );
        let b = claims(
            field(&second, "client_assertion").unwrap(),
            &secret,
            SignatureAlgorithm::HS256,
        );
        assert_eq!(Some("client"), a.issuer.as_deref());
        assert_eq!(Some("client"), a.subject.as_deref());
        assert_eq!(
            Some(SingleOrMultiple::Single(token_endpoint().to_string())),
            a.audience
        );
        assert!(*a.expiry.unwrap() > Utc::now());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn private_key_jwt_assertion() {
        let private_key = Secret::rsa_keypair_from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/rsa_private_key.der"
        ))
        .unwrap();
        let public_key = Secret::public_key_from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/rsa_public_key.der"
        ))
        .unwrap();
        let auth = ClientAuthentication::private_key_jwt(
            "client",
            private_key,
            SignatureAlgorithm::RS256,
            Some("key-1".to_string()),
        );
        let first = auth.prepare(&token_endpoint()).unwrap();
        let second = auth.prepare(&token_endpoint()).unwrap();

        let assertion = field(&first, "client_assertion").unwrap();
        let header = JWT::<Empty, Empty>::new_encoded(assertion)
            .unverified_header()
            .unwrap();
        assert_eq!(Some("key-1"), header.registered.key_id.as_deref());

        let a = claims(assertion, &public_key, SignatureAlgorithm::RS256);
        let b = claims(
            field(&second, "client_assertion").unwrap(),
            &public_key,
            SignatureAlgorithm::RS256,
        );
        assert_eq!(Some("client"), a.issuer.as_deref());
        assert_ne!(a.id, b.id);
        assert!(!format!("{:?}", auth).contains("RsaKeyPair"));
    }
}
