use biscuit::SingleOrMultiple;
use url::Url;

/// The primary extension that OpenID Connect makes to OAuth 2.0 to enable End-Users to be Authenticated is the ID Token data structure. The ID Token is a security token that contains Claims about the Authentication of an End-User by an Authorization Server when using a Client, and potentially other requested Claims. The ID Token is represented as a JSON Web Token (JWT) [JWT].
pub trait Claims {
    /// Issuer Identifier for the Issuer of the response. The iss value is a case sensitive URL using the https scheme that contains scheme, host, and optionally, port number and path components and no query or fragment components.
    fn iss(&self) -> &Url;
    /// Subject Identifier. A locally unique and never reassigned identifier within the Issuer for the End-User, which is intended to be consumed by the Client.
    fn sub(&self) -> &str;
    /// Audience(s) that this ID Token is intended for. It MUST contain the OAuth 2.0 client_id of the Relying Party as an audience value.
    fn aud(&self) -> &SingleOrMultiple<String>;
    /// Expiration time on or after which the ID Token MUST NOT be accepted for processing, in seconds since the UNIX epoch.
    fn exp(&self) -> i64;
    /// Time at which the JWT was issued, in seconds since the UNIX epoch.
    fn iat(&self) -> i64;
    /// Time when the End-User authentication occurred. Required when a `max_age` request is made.
    fn auth_time(&self) -> Option<i64>;
    /// String value used to associate a Client session with an ID Token, and to mitigate replay attacks. The value is passed through unmodified from the Authentication Request to the ID Token.
    fn nonce(&self) -> Option<&String>;
    /// Authentication Context Class Reference.
    fn acr(&self) -> Option<&String>;
    /// Authentication Methods References.
    fn amr(&self) -> Option<&Vec<String>>;
    /// Authorized party - the party to which the ID Token was issued. If present, it MUST contain the OAuth 2.0 Client ID of this party.
    fn azp(&self) -> Option<&String>;
}
