use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// `bytes` of OS randomness, base64url encoded without padding.
pub(crate) fn random_string(bytes: usize) -> Result<String, getrandom::Error> {
    let mut buf = vec![0u8; bytes];
    getrandom::fill(&mut buf)?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}
