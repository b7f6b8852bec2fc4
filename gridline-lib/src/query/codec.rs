//! Value <-> query parameter conversion.

use std::fmt;
use std::sync::Arc;

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::SEARCH;
use crate::config::SortOrder;

/// A value that can live in a query parameter.
///
/// The parsing strategy is chosen by the value's type, and a malformed
/// parameter falls back to the declared default.
pub trait UrlParam: Clone + PartialEq + Send + Sync + 'static {
    /// Renders the value as a raw (not yet form-encoded) string.
    fn to_param(&self) -> String;

    /// Parses a raw parameter, returning `default` when it is malformed.
    fn from_param(raw: &str, default: &Self) -> Self;
}

macro_rules! numeric_param {
    ($($ty:ty),*) => {
        $(
            impl UrlParam for $ty {
                fn to_param(&self) -> String {
                    self.to_string()
                }

                fn from_param(raw: &str, default: &Self) -> Self {
                    raw.trim().parse().unwrap_or_else(|_| {
                        warn!("invalid numeric query value {:?}, using default", raw);
                        *default
                    })
                }
            }
        )*
    };
}

numeric_param!(i32, i64, u32, u64, usize, f64);

impl UrlParam for bool {
    fn to_param(&self) -> String {
        self.to_string()
    }

    fn from_param(raw: &str, default: &Self) -> Self {
        match raw {
            "true" => true,
            "false" => false,
            _ => {
                warn!("invalid boolean query value {:?}, using default", raw);
                *default
            }
        }
    }
}

impl UrlParam for String {
    fn to_param(&self) -> String {
        self.clone()
    }

    fn from_param(raw: &str, _default: &Self) -> Self {
        raw.to_string()
    }
}

impl UrlParam for SortOrder {
    fn to_param(&self) -> String {
        self.as_str().to_string()
    }

    fn from_param(raw: &str, default: &Self) -> Self {
        SortOrder::parse(raw).unwrap_or_else(|| {
            warn!("invalid sort order {:?}, using default", raw);
            *default
        })
    }
}

/// Wrapper for structured values stored as JSON in the URL.
///
/// # Example
///
/// ```
/// use gridline_lib::query::{Json, UrlParam};
///
/// let filters = Json(vec!["active".to_string()]);
/// assert_eq!(filters.to_param(), r#"["active"]"#);
/// assert_eq!(Json::from_param("not json", &filters), filters);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json<T>(pub T);

impl<T> UrlParam for Json<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    fn to_param(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    fn from_param(raw: &str, default: &Self) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => Json(value),
            Err(e) => {
                warn!("invalid JSON query value {:?}: {}", raw, e);
                default.clone()
            }
        }
    }
}

type SerializeFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
type DeserializeFn<T> = Arc<dyn Fn(&str, &T) -> T + Send + Sync>;

/// Serialize/deserialize pair used by a [`UrlState`](super::UrlState).
pub struct Codec<T> {
    serialize: SerializeFn<T>,
    deserialize: DeserializeFn<T>,
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        Self {
            serialize: Arc::clone(&self.serialize),
            deserialize: Arc::clone(&self.deserialize),
        }
    }
}

impl<T> fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl<T: UrlParam> Codec<T> {
    /// Codec built from the type's [`UrlParam`] implementation.
    pub fn param() -> Self {
        Self {
            serialize: Arc::new(|value: &T| value.to_param()),
            deserialize: Arc::new(|raw: &str, default: &T| T::from_param(raw, default)),
        }
    }

    /// Default codec for a key. The `search` key is percent-encoded on top of
    /// the regular form encoding, and percent-decoded when read back.
    pub fn for_key(key: &str) -> Self {
        if key != SEARCH {
            return Self::param();
        }
        Self {
            serialize: Arc::new(|value: &T| urlencoding::encode(&value.to_param()).into_owned()),
            deserialize: Arc::new(|raw: &str, default: &T| {
                let decoded = urlencoding::decode(raw)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| raw.to_string());
                T::from_param(&decoded, default)
            }),
        }
    }
}

impl<T> Codec<T> {
    /// Codec from caller-supplied functions.
    pub fn new(
        serialize: impl Fn(&T) -> String + Send + Sync + 'static,
        deserialize: impl Fn(&str, &T) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    /// Renders a value.
    pub fn serialize(&self, value: &T) -> String {
        (self.serialize)(value)
    }

    /// Parses a raw parameter value.
    pub fn deserialize(&self, raw: &str, default: &T) -> T {
        (self.deserialize)(raw, default)
    }
}
