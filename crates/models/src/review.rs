use serde::{Deserialize, Serialize};

use crate::errors::{require, ModelError};

const MIN_STARS: f64 = 1.0;
const MAX_STARS: f64 = 5.0;
/// Star value given to legacy single-rating reviews that stored none.
const LEGACY_DEFAULT_STARS: f64 = 5.0;

/// Per-aspect star ratings, each 1 to 5.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRatings {
    pub service_quality: f64,
    pub cost_transparency: f64,
    pub communication: f64,
    pub expertise: f64,
    pub dependability: f64,
    pub professionalism: f64,
}

impl ReviewRatings {
    pub fn uniform(stars: f64) -> Self {
        Self {
            service_quality: stars,
            cost_transparency: stars,
            communication: stars,
            expertise: stars,
            dependability: stars,
            professionalism: stars,
        }
    }

    fn aspects(&self) -> [(&'static str, f64); 6] {
        [
            ("serviceQuality", self.service_quality),
            ("costTransparency", self.cost_transparency),
            ("communication", self.communication),
            ("expertise", self.expertise),
            ("dependability", self.dependability),
            ("professionalism", self.professionalism),
        ]
    }

    /// Mean of the aspects, rounded to one decimal place.
    pub fn overall(&self) -> f64 {
        let values = self.aspects();
        round_tenth(values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in self.aspects() {
            if !(MIN_STARS..=MAX_STARS).contains(&value) {
                return Err(ModelError::Validation(format!("{name} rating must be between 1 and 5, got {value}")));
            }
        }
        Ok(())
    }
}

pub fn round_tenth(value: f64) -> f64 { (value * 10.0).round() / 10.0 }

/// A stored customer review.
///
/// Older records carry a single `rating` instead of per-aspect ratings;
/// [`Review::normalize`] fills in the modern fields for those.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub business_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<ReviewRatings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_rating: Option<f64>,
    #[serde(default, skip_serializing)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub comment: String,
    /// RFC 3339 submission time.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub verified: bool,
}

impl Review {
    pub fn normalize(mut self) -> Self {
        if self.ratings.is_none() {
            let stars = self.rating.take().unwrap_or(LEGACY_DEFAULT_STARS);
            self.ratings = Some(ReviewRatings::uniform(stars));
            self.overall_rating = Some(stars);
        }
        if self.overall_rating.map_or(true, f64::is_nan) {
            self.overall_rating = Some(self.ratings.map(|r| r.overall()).unwrap_or(0.0));
        }
        self
    }

    pub fn stars(&self) -> f64 { self.overall_rating.unwrap_or(0.0) }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    /// Reviewer account id; reviews are also indexed per user when present.
    #[serde(default)]
    pub user_id: String,
    pub user_name: String,
    pub ratings: ReviewRatings,
    #[serde(default)]
    pub comment: String,
}

impl ReviewSubmission {
    pub fn validate(&self) -> Result<(), ModelError> {
        require(&self.user_name, "userName")?;
        self.ratings.validate()
    }
}

/// Average star rating and how many reviews it was drawn from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: f64,
    pub review_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings() -> ReviewRatings {
        ReviewRatings {
            service_quality: 5.0,
            cost_transparency: 4.0,
            communication: 5.0,
            expertise: 4.0,
            dependability: 4.0,
            professionalism: 4.0,
        }
    }

    #[test]
    fn overall_is_rounded_mean() {
        assert_eq!(ratings().overall(), 4.3);
        assert_eq!(ReviewRatings::uniform(3.0).overall(), 3.0);
    }

    #[test]
    fn submission_needs_name_and_star_range() {
        let mut s = ReviewSubmission { user_id: String::new(), user_name: "Ada L.".into(), ratings: ratings(), comment: String::new() };
        assert!(s.validate().is_ok());
        s.ratings.expertise = 6.0;
        assert!(matches!(s.validate(), Err(ModelError::Validation(_))));
        s.ratings.expertise = 0.0;
        assert!(s.validate().is_err());
        s.ratings = ratings();
        s.user_name = "  ".into();
        assert_eq!(s.validate(), Err(ModelError::MissingField("userName")));
    }

    #[test]
    fn legacy_single_rating_is_spread() -> Result<(), serde_json::Error> {
        let r: Review = serde_json::from_str(r#"{"id":"r1","rating":3,"comment":"ok"}"#)?;
        let r = r.normalize();
        assert_eq!(r.ratings, Some(ReviewRatings::uniform(3.0)));
        assert_eq!(r.stars(), 3.0);
        assert!(!serde_json::to_string(&r)?.contains("\"rating\""));

        let bare = Review::default().normalize();
        assert_eq!(bare.stars(), 5.0);

        let partial: Review = serde_json::from_str(r#"{"ratings":{"serviceQuality":2,"costTransparency":2,"communication":2,"expertise":2,"dependability":2,"professionalism":5}}"#)?;
        assert_eq!(partial.normalize().stars(), 2.5);
        Ok(())
    }
}
