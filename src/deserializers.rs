use chrono::{DateTime, Duration, Utc};
use de::Visitor;
use serde::de;
use serde::Deserializer;

/// Seconds from now, given either as a JSON number or a numeric string.
pub fn seconds_from_int_or_str<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(OptionalSecondsVisitor)
}

/// Converts a relative `expires_in` into an absolute instant, once, at deserialization.
pub fn expires_in_to_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let expires_in = seconds_from_int_or_str(deserializer)?;
    Ok(lifetime_to_instant(expires_in))
}

/// A zero lifetime means the server gave no usable expiry.
pub(crate) fn lifetime_to_instant(expires_in: Option<u64>) -> Option<DateTime<Utc>> {
    expires_in.filter(|seconds| *seconds > 0).map(expires_at)
}

fn expires_at(expires_in: u64) -> DateTime<Utc> {
    let seconds = i64::try_from(expires_in)
        .unwrap_or(i64::MAX)
        .min(i64::MAX / 1000);
    Utc::now()
        .checked_add_signed(Duration::seconds(seconds))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

struct OptionalSecondsVisitor;

impl<'de> Visitor<'de> for OptionalSecondsVisitor {
    type Value = Option<u64>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("an integer or a string containing seconds")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_some<D>(self, d: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(SecondsVisitor).map(Some)
    }
}

struct SecondsVisitor;

impl<'de> Visitor<'de> for SecondsVisitor {
    type Value = u64;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("an integer or a string containing seconds")
    }

    fn visit_u64<E>(self, value: u64) -> Result<u64, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_i64<E>(self, value: i64) -> Result<u64, E>
    where
        E: de::Error,
    {
        u64::try_from(value).map_err(|_| E::custom(format!("negative seconds: {}", value)))
    }

    fn visit_f64<E>(self, value: f64) -> Result<u64, E>
    where
        E: de::Error,
    {
        if value.is_finite() && value >= 0.0 {
            Ok(value as u64)
        } else {
            Err(E::custom(format!("invalid seconds: {}", value)))
        }
    }

    fn visit_str<E>(self, value: &str) -> Result<u64, E>
    where
        E: de::Error,
    {
        value
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("Unknown string value: {}", value)))
    }
}
