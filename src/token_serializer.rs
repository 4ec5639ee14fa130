use crate::error::ClientError;
use crate::Bearer;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::{Read, Write};

pub type Dumper = fn(&Bearer) -> Result<String, ClientError>;
pub type Loader = fn(&str) -> Result<Bearer, ClientError>;

/// Turns a [`Bearer`] into a compact string for storage, and back.
///
/// The default format is the JSON rendering of the token with its absolute `expires_at`,
/// zlib compressed and base64url encoded. A loaded token expires at the same instant as the
/// dumped one.
#[derive(Debug, Clone, Copy)]
pub struct TokenSerializer {
    dumper: Dumper,
    loader: Loader,
}

impl Default for TokenSerializer {
    fn default() -> Self {
        Self {
            dumper: default_dumper,
            loader: default_loader,
        }
    }
}

impl TokenSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dumper(mut self, dumper: Dumper) -> Self {
        self.dumper = dumper;
        self
    }

    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    pub fn dumps(&self, token: &Bearer) -> Result<String, ClientError> {
        (self.dumper)(token)
    }

    pub fn loads(&self, serialized: &str) -> Result<Bearer, ClientError> {
        (self.loader)(serialized)
    }
}

fn malformed(err: impl std::fmt::Display) -> ClientError {
    ClientError::InvalidArgument(format!("malformed serialized token: {}", err))
}

fn default_dumper(token: &Bearer) -> Result<String, ClientError> {
    let json = serde_json::to_vec(&Value::Object(token.as_json(true)))?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(malformed)?;
    let compressed = encoder.finish().map_err(malformed)?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

fn default_loader(serialized: &str) -> Result<Bearer, ClientError> {
    let compressed = URL_SAFE_NO_PAD.decode(serialized).map_err(malformed)?;
    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(malformed)?;

    let mut json = match serde_json::from_slice::<Value>(&json)? {
        Value::Object(map) => map,
        _ => return Err(malformed("not a JSON object")),
    };
    let expires = match json.remove("expires_at") {
        Some(Value::Number(ts)) => {
            let ts = ts.as_i64().ok_or_else(|| malformed("expires_at"))?;
            Some(
                Utc.timestamp_opt(ts, 0)
                    .single()
                    .ok_or_else(|| malformed("expires_at"))?,
            )
        }
        Some(_) => return Err(malformed("expires_at")),
        None => None,
    };
    let bearer: Bearer = serde_json::from_value(Value::Object(json))?;
    Ok(bearer.with_expires_at(expires))
}
