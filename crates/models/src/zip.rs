use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Reference data for one US zip code.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZipCodeRecord {
    pub zip: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
}

impl ZipCodeRecord {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_zip(&self.zip)?;
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ModelError::Validation(format!("coordinates out of range for {}", self.zip)));
        }
        Ok(())
    }
}

/// Outcome of a bulk zip-code import.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportStats {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// A stored zip code with its distance from the search centre.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZipDistance {
    #[serde(flatten)]
    pub record: ZipCodeRecord,
    pub distance_miles: f64,
}

/// Accepts `NNNNN` or `NNNNN-NNNN`.
pub fn is_valid_zip(zip: &str) -> bool {
    let zip = zip.trim();
    let (base, plus4) = match zip.split_once('-') {
        Some((b, p)) => (b, Some(p)),
        None => (zip, None),
    };
    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());
    digits(base, 5) && plus4.map_or(true, |p| digits(p, 4))
}

pub fn validate_zip(zip: &str) -> Result<(), ModelError> {
    if is_valid_zip(zip) {
        Ok(())
    } else {
        Err(ModelError::Validation(format!("invalid zip code: {zip:?}")))
    }
}

/// The 5-digit form of a valid zip, `None` otherwise.
pub fn five_digit_zip(zip: &str) -> Option<String> {
    if !is_valid_zip(zip) {
        return None;
    }
    Some(zip.trim()[..5].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_formats() {
        assert!(is_valid_zip("12345"));
        assert!(is_valid_zip(" 12345-6789 "));
        assert!(!is_valid_zip("1234"));
        assert!(!is_valid_zip("12345-678"));
        assert!(!is_valid_zip("abcde"));
        assert!(!is_valid_zip(""));
    }

    #[test]
    fn five_digit_strips_plus_four() {
        assert_eq!(five_digit_zip("12345-6789").as_deref(), Some("12345"));
        assert_eq!(five_digit_zip("99999").as_deref(), Some("99999"));
        assert_eq!(five_digit_zip("9999"), None);
    }

    #[test]
    fn record_rejects_bad_coordinates() {
        let rec = ZipCodeRecord {
            zip: "10001".into(),
            city: "New York".into(),
            state: "NY".into(),
            latitude: 123.0,
            longitude: -73.99,
            county: None,
        };
        assert!(rec.validate().is_err());
    }
}
