use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require, ModelError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayType {
    Hourly,
    Salary,
    Other,
    #[default]
    #[serde(other)]
    None,
}

/// One entry of the benefits map, keyed by a camelCase benefit name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JobBenefit {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JobBenefit {
    /// `healthInsurance` -> `Health Insurance`, with details in parentheses.
    fn display(&self, key: &str) -> String {
        let mut name = String::with_capacity(key.len() + 4);
        for (i, c) in key.chars().enumerate() {
            if i == 0 {
                name.extend(c.to_uppercase());
            } else {
                if c.is_uppercase() {
                    name.push(' ');
                }
                name.push(c);
            }
        }
        match self.details.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(details) => format!("{name} ({details})"),
            None => name,
        }
    }
}

/// Job listing fields supplied by the business.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobListingInput {
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub qualifications: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub business_description: String,
    #[serde(default)]
    pub business_address: String,
    #[serde(default)]
    pub work_hours: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub pay_type: PayType,
    #[serde(default)]
    pub hourly_min: Option<String>,
    #[serde(default)]
    pub hourly_max: Option<String>,
    #[serde(default)]
    pub salary_min: Option<String>,
    #[serde(default)]
    pub salary_max: Option<String>,
    #[serde(default)]
    pub other_pay: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub benefits: BTreeMap<String, JobBenefit>,
}

impl JobListingInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        require(&self.job_title, "jobTitle")?;
        if !self.contact_email.trim().is_empty() {
            crate::business::validate_email(&self.contact_email)?;
        }
        Ok(())
    }
}

/// Stored listing (`job:<businessId>:<jobId>`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub business_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: JobListingInput,
}

/// Card-ready projection of a listing.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormattedJob {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub posted: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub benefits: Vec<String>,
}

fn pay_range(min: Option<&str>, max: Option<&str>, unit: &str) -> String {
    let min = min.map(str::trim).unwrap_or_default();
    match max.map(str::trim).filter(|m| !m.is_empty()) {
        Some(max) => format!("${min}-${max}/{unit}"),
        None => format!("${min}/{unit}"),
    }
}

impl JobListing {
    pub fn format(&self) -> FormattedJob {
        let d = &self.details;
        let salary = match d.pay_type {
            PayType::Hourly => pay_range(d.hourly_min.as_deref(), d.hourly_max.as_deref(), "hr"),
            PayType::Salary => pay_range(d.salary_min.as_deref(), d.salary_max.as_deref(), "yr"),
            _ => d
                .other_pay
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "Compensation details upon inquiry".to_string()),
        };
        let or = |v: &str, fallback: &str| if v.trim().is_empty() { fallback.to_string() } else { v.to_string() };
        FormattedJob {
            id: self.id.clone(),
            title: d.job_title.clone(),
            company: d.business_name.clone(),
            location: or(&d.business_address, "Location varies"),
            salary,
            job_type: or(&d.work_hours, "Not specified"),
            posted: self
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Recently".to_string()),
            description: d.job_description.clone(),
            logo: d.logo_url.clone(),
            benefits: d
                .benefits
                .iter()
                .filter(|(_, b)| b.enabled)
                .map(|(key, b)| b.display(key))
                .collect(),
        }
    }
}
