use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require, ModelError};

/// One category/subcategory pick made by a business.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategorySelection {
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
}

impl CategorySelection {
    /// Stored `fullPath`, or `category > subcategory` when it was never written.
    pub fn path(&self) -> String {
        if let Some(p) = self.full_path.as_deref().filter(|p| !p.trim().is_empty()) {
            return p.to_string();
        }
        match self.subcategory.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(sub) => format!("{} > {}", self.category, sub),
            None => self.category.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySuggestionInput {
    #[serde(default)]
    pub business_id: Option<String>,
    pub category: String,
    pub subcategory: String,
    #[serde(default)]
    pub reason: String,
}

impl CategorySuggestionInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        require(&self.category, "category")?;
        require(&self.subcategory, "subcategory")?;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySuggestion {
    pub id: String,
    #[serde(default)]
    pub business_id: Option<String>,
    pub category: String,
    pub subcategory: String,
    #[serde(default)]
    pub reason: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}
