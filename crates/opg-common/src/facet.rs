//! Facet identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer id of a topographic facet.
///
/// Facet ids come from two places that must agree: numeric cells of the
/// facet grid (often written as floats, e.g. `2131.0`) and the column
/// headers of the OPG table. Both parse through [`FacetId::from_f64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetId(pub u32);

impl FacetId {
    /// Convert a numeric grid cell to a facet id.
    ///
    /// Non-finite, negative, fractional or out-of-range values are not facets.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return None;
        }
        Some(Self(value as u32))
    }
}

impl fmt::Display for FacetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FacetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Self::from_f64)
            .ok_or_else(|| format!("not a facet id: '{}'", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_and_float_forms() {
        assert_eq!("2131".parse::<FacetId>().unwrap(), FacetId(2131));
        assert_eq!("2131.0".parse::<FacetId>().unwrap(), FacetId(2131));
        assert_eq!(" 7 ".parse::<FacetId>().unwrap(), FacetId(7));
    }

    #[test]
    fn test_rejects_non_ids() {
        assert!("2131.5".parse::<FacetId>().is_err());
        assert!("-1".parse::<FacetId>().is_err());
        assert!("NaN".parse::<FacetId>().is_err());
        assert!("abc".parse::<FacetId>().is_err());
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(FacetId::from_f64(12.0), Some(FacetId(12)));
        assert_eq!(FacetId::from_f64(f64::NAN), None);
    }
}
