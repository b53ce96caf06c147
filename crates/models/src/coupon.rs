use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{require, ModelError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CouponSize {
    #[default]
    Small,
    Large,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub expiration_date: String,
    #[serde(default)]
    pub size: CouponSize,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub terms: String,
}

impl Coupon {
    pub fn validate(&self) -> Result<(), ModelError> {
        require(&self.title, "title")?;
        let parse = |s: &str| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok();
        if let (Some(start), Some(end)) = (parse(&self.start_date), parse(&self.expiration_date)) {
            if end < start {
                return Err(ModelError::Validation(format!(
                    "coupon {:?} expires before it starts",
                    self.title
                )));
            }
        }
        Ok(())
    }
}
