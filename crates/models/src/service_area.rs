use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::zip::{five_digit_zip, validate_zip};

/// Zip codes a business serves, or nationwide coverage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArea {
    #[serde(default)]
    pub zip_codes: Vec<String>,
    #[serde(default)]
    pub is_nationwide: bool,
    #[serde(default, rename = "radius", skip_serializing_if = "Option::is_none")]
    pub radius_miles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_zip: Option<String>,
}

impl ServiceArea {
    pub fn validate(&self) -> Result<(), ModelError> {
        for zip in &self.zip_codes {
            validate_zip(zip)?;
        }
        if let Some(central) = &self.central_zip {
            validate_zip(central)?;
        }
        if let Some(r) = self.radius_miles {
            if !(r.is_finite() && r >= 0.0) {
                return Err(ModelError::Validation("radius must be a non-negative number".into()));
            }
        }
        Ok(())
    }

    /// 5-digit zips, first occurrence order, duplicates dropped.
    pub fn normalized_zips(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for zip in self.zip_codes.iter().filter_map(|z| five_digit_zip(z)) {
            if !out.contains(&zip) {
                out.push(zip);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_dedupes() {
        let area = ServiceArea {
            zip_codes: vec!["10001".into(), "10001-1234".into(), "10002".into()],
            ..Default::default()
        };
        assert!(area.validate().is_ok());
        assert_eq!(area.normalized_zips(), vec!["10001", "10002"]);
    }

    #[test]
    fn rejects_bad_zip_and_radius() {
        let area = ServiceArea { zip_codes: vec!["1".into()], ..Default::default() };
        assert!(area.validate().is_err());
        let area = ServiceArea { radius_miles: Some(-5.0), ..Default::default() };
        assert!(area.validate().is_err());
    }

    #[test]
    fn radius_uses_wire_name() -> Result<(), serde_json::Error> {
        let area: ServiceArea = serde_json::from_str(r#"{"zipCodes":["10001"],"isNationwide":false,"radius":25,"centralZip":"10001"}"#)?;
        assert_eq!(area.radius_miles, Some(25.0));
        assert_eq!(area.central_zip.as_deref(), Some("10001"));
        Ok(())
    }
}
