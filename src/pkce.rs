/*!
PKCE - Proof Key for Code Exchange by OAuth Public Clients

Proof Key for Code Exchange by OAuth Public Clients (PKCE) is a method for public clients to protect against authorization code interception attacks. The client generates a random code verifier, sends a challenge derived from it with the authorization request, and proves possession of the verifier when redeeming the code at the token endpoint.

See [RFC 7636](https://tools.ietf.org/html/rfc7636) for more details.
*/

use crate::error::{Error, Validation};
use crate::random::random_string;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Code challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeChallengeMethod {
    /// The code challenge is the base64url encoded SHA-256 hash of the code verifier.
    #[default]
    S256,
    /// The code challenge is the code verifier.
    Plain,
}

impl CodeChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeChallengeMethod::S256 => "S256",
            CodeChallengeMethod::Plain => "plain",
        }
    }
}

/// PKCE - Proof Key for Code Exchange by OAuth Public Clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pkce {
    /// S256 code challenge method.
    ///
    /// The S256 method uses a SHA-256 hash of the code verifier to generate the
    /// code challenge.
    S256(PkceSha256),
    /// Plain code challenge method.
    ///
    /// The Plain method uses the code verifier as the code challenge.
    Plain(String),
}

impl Pkce {
    /// Generates a fresh code verifier and derives its challenge.
    pub fn generate(method: CodeChallengeMethod) -> Result<Self, Error> {
        let code_verifier = generate_code_verifier()?;
        Ok(Self::from_verifier_unchecked(code_verifier, method))
    }

    /// Derives the challenge for a caller supplied code verifier.
    ///
    /// The verifier must be 43 to 128 characters from the unreserved set
    /// `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`.
    pub fn from_verifier(code_verifier: String, method: CodeChallengeMethod) -> Result<Self, Error> {
        validate_code_verifier(&code_verifier)?;
        Ok(Self::from_verifier_unchecked(code_verifier, method))
    }

    fn from_verifier_unchecked(code_verifier: String, method: CodeChallengeMethod) -> Self {
        match method {
            CodeChallengeMethod::S256 => Pkce::S256(PkceSha256::replicate(code_verifier)),
            CodeChallengeMethod::Plain => Pkce::Plain(code_verifier),
        }
    }

    /// Get the code verifier.
    pub fn code_verifier(&self) -> &str {
        match self {
            Pkce::S256(pkce) => &pkce.code_verifier,
            Pkce::Plain(code_verifier) => code_verifier,
        }
    }

    /// Get the code challenge.
    pub fn code_challenge(&self) -> &str {
        match self {
            Pkce::S256(pkce) => &pkce.code_challenge,
            Pkce::Plain(code_challenge) => code_challenge,
        }
    }

    /// Get the code challenge method.
    pub fn code_challenge_method(&self) -> CodeChallengeMethod {
        match self {
            Pkce::S256(_) => CodeChallengeMethod::S256,
            Pkce::Plain(_) => CodeChallengeMethod::Plain,
        }
    }
}

/// S256 code challenge method.
///
/// The S256 method uses a SHA-256 hash of the code verifier to generate the
/// code challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceSha256 {
    /// A cryptographically random string that is used to correlate the
    /// authorization request to the token request.
    pub code_verifier: String,
    /// A challenge derived from the code verifier that is sent in the
    /// authorization request, to be verified against later.
    pub code_challenge: String,
}

impl PkceSha256 {
    /// Create a new PKCE S256 code verifier and challenge from an existing code
    /// verifier.
    pub fn replicate(code_verifier: String) -> Self {
        let code_challenge = s256_code_challenge(&code_verifier);
        PkceSha256 {
            code_verifier,
            code_challenge,
        }
    }
}

fn generate_code_verifier() -> Result<String, Error> {
    // 32 bytes encode to 43 characters, the minimum length
    Ok(random_string(32)?)
}

/// `BASE64URL-ENCODE(SHA256(ASCII(code_verifier)))`
pub fn s256_code_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(hmac_sha256::Hash::hash(code_verifier.as_bytes()))
}

fn validate_code_verifier(code_verifier: &str) -> Result<(), Error> {
    let len = code_verifier.len();
    if !(43..=128).contains(&len) {
        return Err(Validation::CodeVerifier(format!(
            "length must be between 43 and 128, got {}",
            len
        ))
        .into());
    }
    if let Some(c) = code_verifier
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')))
    {
        return Err(Validation::CodeVerifier(format!("invalid character {:?}", c)).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc7636_appendix_b() {
        let pkce = Pkce::from_verifier(
            "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            CodeChallengeMethod::S256,
        )
        .unwrap();
        assert_eq!(
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
            pkce.code_challenge()
        );
        assert_eq!("S256", pkce.code_challenge_method().as_str());
    }

    #[test]
    fn s256_challenge_is_hash_of_verifier() {
        let pkce = Pkce::generate(CodeChallengeMethod::S256).unwrap();
        assert_eq!(43, pkce.code_verifier().len());
        assert_eq!(
            s256_code_challenge(pkce.code_verifier()),
            pkce.code_challenge()
        );
        assert_ne!(pkce.code_verifier(), pkce.code_challenge());
    }

    #[test]
    fn plain_challenge_is_verifier() {
        let pkce = Pkce::generate(CodeChallengeMethod::Plain).unwrap();
        assert_eq!(pkce.code_verifier(), pkce.code_challenge());
        assert_eq!("plain", pkce.code_challenge_method().as_str());
    }

    #[test]
    fn fresh_verifier_per_generation() {
        let a = Pkce::generate(CodeChallengeMethod::S256).unwrap();
        let b = Pkce::generate(CodeChallengeMethod::S256).unwrap();
        assert_ne!(a.code_verifier(), b.code_verifier());
    }

    #[test]
    fn rejects_bad_verifiers() {
        assert!(Pkce::from_verifier("short".into(), CodeChallengeMethod::S256).is_err());
        assert!(Pkce::from_verifier("a".repeat(129), CodeChallengeMethod::S256).is_err());
        let spaced = format!("{} ", "a".repeat(50));
        assert!(Pkce::from_verifier(spaced, CodeChallengeMethod::Plain).is_err());
        assert!(Pkce::from_verifier("a~b.c_d-".repeat(6), CodeChallengeMethod::Plain).is_ok());
    }
}
