use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require, ModelError};
use crate::zip::validate_zip;

/// Stored business record (`business:<id>`).
///
/// Records written by older code may lack most fields, so everything except
/// `id` tolerates absence. `id` itself is re-filled from the key when blank.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, alias = "name")]
    pub business_name: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub all_categories: Vec<String>,
    #[serde(default)]
    pub all_subcategories: Vec<String>,
    #[serde(default)]
    pub categories_count: usize,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Business {
    /// Every category and subcategory label the record references, in record order.
    pub fn referenced_categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let candidates = self
            .category
            .iter()
            .chain(self.subcategory.iter())
            .chain(self.all_categories.iter())
            .chain(self.all_subcategories.iter());
        for c in candidates {
            let c = c.trim();
            if !c.is_empty() && !out.iter().any(|o| o == c) {
                out.push(c.to_string());
            }
        }
        out
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBusinessInput {
    pub first_name: String,
    pub last_name: String,
    pub business_name: String,
    pub zip_code: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RegisterBusinessInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        require(&self.first_name, "firstName")?;
        require(&self.last_name, "lastName")?;
        require(&self.business_name, "businessName")?;
        require(&self.email, "email")?;
        validate_email(&self.email)?;
        validate_zip(&self.zip_code)?;
        Ok(())
    }
}

/// Partial profile update; absent fields are left alone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    pub zip_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

impl UpdateBusinessInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (value, field) in [
            (&self.first_name, "firstName"),
            (&self.last_name, "lastName"),
            (&self.business_name, "businessName"),
        ] {
            if let Some(v) = value {
                require(v, field)?;
            }
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(zip) = &self.zip_code {
            validate_zip(zip)?;
        }
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    let invalid = || ModelError::Validation(format!("invalid email address: {email:?}"));
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RegisterBusinessInput {
        RegisterBusinessInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            business_name: "Analytical Lawn Care".into(),
            zip_code: "10001".into(),
            email: "ada@example.com".into(),
            phone: None,
            description: None,
        }
    }

    #[test]
    fn register_input_validates() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.business_name = "  ".into();
        assert_eq!(bad.validate(), Err(ModelError::MissingField("businessName")));

        let mut bad = input();
        bad.zip_code = "1000".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a b@c.co").is_err());
        assert!(validate_email("a@@b.co").is_err());
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn legacy_record_with_name_alias_decodes() -> Result<(), serde_json::Error> {
        let b: Business = serde_json::from_str(r#"{"name":"Old Shop","zipCode":"12345"}"#)?;
        assert_eq!(b.business_name, "Old Shop");
        assert!(b.id.is_empty());
        assert!(b.all_categories.is_empty());
        Ok(())
    }

    #[test]
    fn referenced_categories_dedupes_in_order() {
        let b = Business {
            category: Some("Pet Care".into()),
            subcategory: Some("Dog Walking".into()),
            all_categories: vec!["Pet Care".into(), "Retail Stores".into()],
            all_subcategories: vec!["".into(), "Dog Walking".into()],
            ..Default::default()
        };
        assert_eq!(b.referenced_categories(), vec!["Pet Care", "Dog Walking", "Retail Stores"]);
    }
}
