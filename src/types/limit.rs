//! Plan ceilings that may be unlimited.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A plan ceiling: a concrete count, or the "no ceiling" sentinel.
///
/// Serializes as a plain integer (`1000`) or the string `"unlimited"`,
/// so the entitlement table stays readable in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Limited(u64),
    Unlimited,
}

impl Limit {
    /// True once `used` has reached the ceiling. Used for the scalar
    /// request-counter checks, where the ceiling itself is the first
    /// denied value.
    pub fn reached(&self, used: u64) -> bool {
        match self {
            Limit::Limited(max) => used >= *max,
            Limit::Unlimited => false,
        }
    }

    /// True if `projected` would go past the ceiling. The ceiling itself
    /// is still allowed; used for the storage and element pre-flight
    /// checks, whose boundary is inclusive.
    pub fn exceeded_by(&self, projected: u64) -> bool {
        match self {
            Limit::Limited(max) => projected > *max,
            Limit::Unlimited => false,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Limited(max) => write!(f, "{}", max),
            Limit::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Limited(max) => serializer.serialize_u64(*max),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LimitVisitor;

        impl Visitor<'_> for LimitVisitor {
            type Value = Limit;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or the string \"unlimited\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Limit, E> {
                Ok(Limit::Limited(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Limit, E> {
                u64::try_from(value)
                    .map(Limit::Limited)
                    .map_err(|_| E::custom("limit must not be negative"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Limit, E> {
                if value == "unlimited" {
                    Ok(Limit::Unlimited)
                } else {
                    Err(E::custom(format!("unknown limit value: {value}")))
                }
            }
        }

        deserializer.deserialize_any(LimitVisitor)
    }
}
