//! Typed preference values.

use serde::{Deserialize, Serialize};

/// A stored preference. The variant is the key's type: reading a key with a
/// different type than it was written with yields the caller's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PrefValue {
    String(String),
    Int(i32),
    Bool(bool),
    Float(f32),
    Long(i64),
}

/// Rust types that can be stored as a [`PrefValue`].
pub trait PrefType: Clone + Send + Sync + 'static {
    fn into_pref(self) -> PrefValue;

    fn from_pref(value: &PrefValue) -> Option<Self>;
}

macro_rules! pref_type {
    ($ty:ty, $variant:ident) => {
        impl PrefType for $ty {
            fn into_pref(self) -> PrefValue {
                PrefValue::$variant(self)
            }

            fn from_pref(value: &PrefValue) -> Option<Self> {
                match value {
                    PrefValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

pref_type!(String, String);
pref_type!(i32, Int);
pref_type!(bool, Bool);
pref_type!(f32, Float);
pref_type!(i64, Long);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_variant_converts() {
        assert_eq!(i32::from_pref(&7_i32.into_pref()), Some(7));
        assert_eq!(
            String::from_pref(&"dark".to_string().into_pref()),
            Some("dark".to_string())
        );
    }

    #[test]
    fn mismatched_variant_is_none() {
        assert_eq!(i64::from_pref(&PrefValue::Int(7)), None);
        assert_eq!(bool::from_pref(&PrefValue::String("true".into())), None);
    }
}
