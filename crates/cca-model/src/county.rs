//! County identity

use crate::error::IdentityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated county identity
///
/// Construction is the single fail-fast boundary of the subsystem: once an
/// identity exists, every downstream operation returns a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountyIdentity {
    /// Caller-side primary key
    pub county_id: String,
    /// Five-digit county FIPS code
    pub county_fips: String,
    /// Display name, e.g. "Travis County"
    pub county_name: String,
    /// Two-letter USPS state code, upper case
    pub state_code: String,
}

impl CountyIdentity {
    /// Validate and build an identity
    ///
    /// # Errors
    /// - `IdentityError::MissingField` for empty fields
    /// - `IdentityError::InvalidFips` unless the FIPS code is 5 digits
    /// - `IdentityError::InvalidStateCode` unless the state is 2 letters
    pub fn new(
        county_id: impl Into<String>,
        county_fips: impl Into<String>,
        county_name: impl Into<String>,
        state_code: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let county_id = required("county_id", county_id.into())?;
        let county_fips = required("county_fips", county_fips.into())?;
        let county_name = required("county_name", county_name.into())?;
        let state_code = required("state_code", state_code.into())?;

        if county_fips.len() != 5 || !county_fips.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentityError::InvalidFips(county_fips));
        }
        if state_code.len() != 2 || !state_code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(IdentityError::InvalidStateCode(state_code));
        }

        Ok(Self {
            county_id,
            county_fips,
            county_name,
            state_code: state_code.to_ascii_uppercase(),
        })
    }

    /// Lowercased name with the "county" suffix and non-alphanumerics removed
    ///
    /// `"St. Mary's County"` becomes `"stmarys"`.
    #[must_use]
    pub fn name_slug(&self) -> String {
        let lowered = self.county_name.trim().to_lowercase();
        let stem = lowered
            .strip_suffix("county")
            .map(str::trim_end)
            .unwrap_or(&lowered);
        stem.chars().filter(char::is_ascii_alphanumeric).collect()
    }
}

impl fmt::Display for CountyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} ({})", self.county_name, self.state_code, self.county_fips)
    }
}

fn required(field: &'static str, value: String) -> Result<String, IdentityError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(IdentityError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identity_normalizes_state() {
        let id = CountyIdentity::new("c-1", "48453", "Travis County", "tx").unwrap();
        assert_eq!(id.state_code, "TX");
        assert_eq!(id.to_string(), "Travis County, TX (48453)");
    }

    #[test]
    fn missing_fields_fail_fast() {
        assert_eq!(
            CountyIdentity::new("", "48453", "Travis", "TX"),
            Err(IdentityError::MissingField("county_id"))
        );
        assert_eq!(
            CountyIdentity::new("c-1", "48453", "   ", "TX"),
            Err(IdentityError::MissingField("county_name"))
        );
    }

    #[test]
    fn malformed_codes_rejected() {
        assert!(matches!(
            CountyIdentity::new("c-1", "4845", "Travis", "TX"),
            Err(IdentityError::InvalidFips(_))
        ));
        assert!(matches!(
            CountyIdentity::new("c-1", "48453", "Travis", "T1"),
            Err(IdentityError::InvalidStateCode(_))
        ));
    }

    #[test]
    fn slug_strips_suffix_and_punctuation() {
        let id = CountyIdentity::new("c-2", "24037", "St. Mary's County", "MD").unwrap();
        assert_eq!(id.name_slug(), "stmarys");
        let id = CountyIdentity::new("c-3", "51059", "Fairfax", "VA").unwrap();
        assert_eq!(id.name_slug(), "fairfax");
        let id = CountyIdentity::new("c-4", "22071", "Orleans Parish", "LA").unwrap();
        assert_eq!(id.name_slug(), "orleansparish");
    }
}
