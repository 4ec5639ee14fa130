use crate::{
    error::{Error, Expiry, Mismatch, Missing, Validation},
    Claims,
};
use biscuit::SingleOrMultiple;
use chrono::{DateTime, Duration, Utc};
use url::Url;

pub fn validate_token_issuer<C: Claims>(claims: &C, issuer: &Url) -> Result<(), Error> {
    if claims.iss() != issuer {
        let expected = issuer.as_str().to_string();
        let actual = claims.iss().as_str().to_string();
        return Err(Validation::Mismatch(Mismatch::Issuer { expected, actual }).into());
    }

    Ok(())
}

pub fn validate_token_nonce<C: Claims>(claims: &C, nonce: Option<&str>) -> Result<(), Error> {
    match nonce {
        Some(expected) => match claims.nonce() {
            Some(actual) => {
                if expected != actual {
                    let expected = expected.to_string();
                    let actual = actual.to_string();
                    return Err(Validation::Mismatch(Mismatch::Nonce { expected, actual }).into());
                }
            }
            None => return Err(Validation::Missing(Missing::Nonce).into()),
        },
        None => {
            if claims.nonce().is_some() {
                return Err(Validation::Missing(Missing::Nonce).into());
            }
        }
    }

    Ok(())
}

pub fn validate_token_aud<C: Claims>(claims: &C, client_id: &str) -> Result<(), Error> {
    if !claims.aud().contains(client_id) {
        return Err(Validation::Missing(Missing::Audience).into());
    }
    // Multiple audiences require an authorized party
    if let SingleOrMultiple::Multiple(_) = claims.aud() {
        if claims.azp().is_none() {
            return Err(Validation::Missing(Missing::AuthorizedParty).into());
        }
    }
    if let Some(actual) = claims.azp() {
        if actual != client_id {
            let expected = client_id.to_string();
            let actual = actual.to_string();
            return Err(
                Validation::Mismatch(Mismatch::AuthorizedParty { expected, actual }).into(),
            );
        }
    }

    Ok(())
}

pub fn validate_token_exp<C: Claims>(claims: &C, max_age: Option<&Duration>) -> Result<(), Error> {
    validate_token_exp_at(claims, max_age, Utc::now())
}

pub(crate) fn validate_token_exp_at<C: Claims>(
    claims: &C,
    max_age: Option<&Duration>,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let exp = claims.exp();
    if exp <= now.timestamp() {
        return Err(Validation::Expired(
            DateTime::from_timestamp(exp, 0)
                .map(Expiry::Expires)
                .unwrap_or(Expiry::NotUnix(exp)),
        )
        .into());
    }

    if let Some(max) = max_age {
        match claims.auth_time() {
            Some(time) => {
                let age = Duration::seconds(now.timestamp() - time);
                if age >= *max {
                    return Err(Validation::Expired(Expiry::MaxAge(age)).into());
                }
            }
            None => return Err(Validation::Missing(Missing::AuthTime).into()),
        }
    }

    Ok(())
}

/// Compares the `state` echoed by the authorization server with the one that was sent.
pub fn validate_state(expected: &str, actual: Option<&str>) -> Result<(), Error> {
    match actual {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => {
            let expected = expected.to_string();
            let actual = actual.to_string();
            Err(Validation::Mismatch(Mismatch::State { expected, actual }).into())
        }
        None => Err(Validation::Missing(Missing::State).into()),
    }
}
