use core::fmt::Display;
use core::str::FromStr;

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NativeOrString<T> {
    Native(T),
    String(String),
}

/// Deserializes a value from either its native representation or a string.
///
/// Environment overrides always arrive as strings.
pub fn from_anything<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NativeOrString::<T>::deserialize(deserializer)? {
        NativeOrString::Native(value) => Ok(value),
        NativeOrString::String(s) => s
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid value `{s}`: {e}"))),
    }
}
