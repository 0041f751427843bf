//! String-code value types.
//!
//! Stores and items are addressed by operator-facing codes ("HQ",
//! "Bangna", "A1"), not synthetic ids. The newtypes keep the two code
//! spaces from being mixed up and reject blank values at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Code of a store or the head-office warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreCode(String);

/// Catalog code of a stock item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

macro_rules! impl_code_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a code, rejecting blank input.
            pub fn new(code: impl Into<String>) -> Result<Self, Error> {
                let code = code.into();
                if code.trim().is_empty() {
                    return Err(Error::validation(concat!($name, " must not be blank")));
                }
                Ok(Self(code))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_code_newtype!(StoreCode, "store code");
impl_code_newtype!(ItemCode, "item code");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_codes_are_rejected() {
        assert!(StoreCode::new("").is_err());
        assert!(StoreCode::new("   ").is_err());
        assert!(ItemCode::new("").is_err());
    }

    #[test]
    fn codes_round_trip_as_plain_strings() {
        let code = ItemCode::new("A1").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"A1\"");
        let back: ItemCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }
}
