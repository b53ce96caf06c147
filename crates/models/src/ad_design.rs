use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomButton {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

/// Contact block shown on the AdBox card.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub free_text: String,
}

/// Header image placement; positions are percentages of the frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeaderImage {
    pub url: String,
    #[serde(default = "centered")]
    pub position_x: f64,
    #[serde(default = "centered")]
    pub position_y: f64,
    #[serde(default = "unit_zoom")]
    pub zoom: f64,
}

fn centered() -> f64 { 50.0 }
fn unit_zoom() -> f64 { 1.0 }

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdDesign {
    #[serde(default)]
    pub design_id: u32,
    #[serde(default)]
    pub color_scheme: String,
    #[serde(default)]
    pub texture: String,
    #[serde(default)]
    pub custom_button: CustomButton,
    #[serde(default)]
    pub business_info: BusinessInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image: Option<HeaderImage>,
    /// Contact fields the owner chose not to show.
    #[serde(default)]
    pub hidden_fields: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AdDesign {
    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(img) = &self.header_image {
            if img.url.trim().is_empty() {
                return Err(ModelError::MissingField("headerImage.url"));
            }
            for (v, name) in [(img.position_x, "positionX"), (img.position_y, "positionY")] {
                if !(0.0..=100.0).contains(&v) {
                    return Err(ModelError::Validation(format!("{name} must be within 0..=100")));
                }
            }
            if !(0.5..=3.0).contains(&img.zoom) {
                return Err(ModelError::Validation("zoom must be within 0.5..=3.0".into()));
            }
        }
        if !self.business_info.zip_code.trim().is_empty() {
            crate::zip::validate_zip(&self.business_info.zip_code)?;
        }
        Ok(())
    }
}

impl BusinessInfo {
    /// "City, ST", then city, then state, then "Zip: <zip>".
    pub fn display_location(&self, fallback_zip: &str) -> Option<String> {
        let city = self.city.trim();
        let state = self.state.trim();
        match (city.is_empty(), state.is_empty()) {
            (false, false) => Some(format!("{city}, {state}")),
            (false, true) => Some(city.to_string()),
            (true, false) => Some(state.to_string()),
            (true, true) => {
                let zip = if self.zip_code.trim().is_empty() { fallback_zip.trim() } else { self.zip_code.trim() };
                (!zip.is_empty()).then(|| format!("Zip: {zip}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_image_bounds() {
        let mut d = AdDesign {
            header_image: Some(HeaderImage { url: "https://img/x.png".into(), position_x: 50.0, position_y: 101.0, zoom: 1.0 }),
            ..Default::default()
        };
        assert!(d.validate().is_err());
        if let Some(img) = d.header_image.as_mut() {
            img.position_y = 0.0;
            img.zoom = 4.0;
        }
        assert!(d.validate().is_err());
        if let Some(img) = d.header_image.as_mut() {
            img.zoom = 2.5;
        }
        assert!(d.validate().is_ok());
    }

    #[test]
    fn location_fallback_chain() {
        let mut info = BusinessInfo { city: "Austin".into(), state: "TX".into(), ..Default::default() };
        assert_eq!(info.display_location("").as_deref(), Some("Austin, TX"));
        info.state.clear();
        assert_eq!(info.display_location("").as_deref(), Some("Austin"));
        info.city.clear();
        info.state = "TX".into();
        assert_eq!(info.display_location("").as_deref(), Some("TX"));
        info.state.clear();
        assert_eq!(info.display_location("73301").as_deref(), Some("Zip: 73301"));
        assert_eq!(info.display_location(""), None);
    }

    #[test]
    fn header_defaults_when_only_url_given() -> Result<(), serde_json::Error> {
        let d: AdDesign = serde_json::from_str(r#"{"headerImage":{"url":"u"},"customButton":{"type":"menu","name":"Menu","icon":"utensils"}}"#)?;
        let img = d.header_image.unwrap_or_else(|| panic!("header image missing"));
        assert_eq!((img.position_x, img.position_y, img.zoom), (50.0, 50.0, 1.0));
        assert_eq!(d.custom_button.kind, "menu");
        Ok(())
    }
}
