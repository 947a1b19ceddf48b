//! Known permitting vendor URL patterns
//!
//! Table order is match order: the first vendor whose pattern matches wins.

use crate::error::DetectorError;
use once_cell::sync::Lazy;
use regex::Regex;

/// A compiled vendor pattern
#[derive(Debug, Clone)]
pub struct VendorPattern {
    /// Vendor display name
    pub vendor: &'static str,
    /// URL pattern
    pub pattern: Regex,
}

const VENDOR_TABLE: &[(&str, &str)] = &[
    ("Accela", r"(?i)accela\.com|/citizenaccess/"),
    ("Tyler EnerGov", r"(?i)energov|tylerhost\.net|tylertech\.com"),
    ("OpenGov", r"(?i)viewpointcloud\.com|opengov\.com"),
    ("Citizenserve", r"(?i)citizenserve\.com"),
    ("iWorQ", r"(?i)iworq\.net"),
    ("MGO Connect", r"(?i)mgoconnect\.org"),
    ("SmartGov", r"(?i)smartgovcommunity\.com"),
    ("CentralSquare", r"(?i)etrakit|centralsquare"),
    ("Cloudpermit", r"(?i)cloudpermit\.com"),
];

static VENDOR_PATTERNS: Lazy<Result<Vec<VendorPattern>, regex::Error>> = Lazy::new(|| {
    VENDOR_TABLE
        .iter()
        .map(|&(vendor, pattern)| {
            Regex::new(pattern).map(|pattern| VendorPattern {
                vendor,
                pattern,
            })
        })
        .collect()
});

/// Compiled vendor table
///
/// # Errors
/// `DetectorError::PatternTable` if any pattern failed to compile.
pub fn vendor_patterns() -> Result<&'static [VendorPattern], DetectorError> {
    VENDOR_PATTERNS
        .as_ref()
        .map(Vec::as_slice)
        .map_err(|e| DetectorError::PatternTable {
            table: "vendors",
            message: e.to_string(),
        })
}

/// First vendor whose pattern matches `url`
///
/// # Errors
/// As [`vendor_patterns`].
pub fn match_vendor(url: &str) -> Result<Option<&'static str>, DetectorError> {
    Ok(vendor_patterns()?
        .iter()
        .find(|v| v.pattern.is_match(url))
        .map(|v| v.vendor))
}
