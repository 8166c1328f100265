//! Domain services
//!
//! Every operation takes the caller as an explicit [`CurrentUser`]
//! argument; handlers only decode requests and wrap results.
//!
//! [`CurrentUser`]: crate::middleware::CurrentUser

use serde::{de, Deserialize, Deserializer, Serialize};

pub mod team;
pub mod user;

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
    pub pages: u64,
    pub current: u64,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// An integer field that clients may also send as a numeric string
#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i32<E: de::Error>(self) -> Result<i32, E> {
        match self {
            IntOrString::Int(n) => i32::try_from(n).map_err(E::custom),
            IntOrString::Str(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

/// `5` or `"5"`
pub(crate) fn deserialize_lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    IntOrString::deserialize(deserializer)?.into_i32()
}

/// Like [`deserialize_lenient_i32`], `null` reads as absent
pub(crate) fn deserialize_lenient_opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IntOrString>::deserialize(deserializer)?
        .map(IntOrString::into_i32)
        .transpose()
}
