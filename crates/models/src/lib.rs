//! Domain records for the business directory.
//!
//! Everything here is plain data plus input validation; persistence and
//! index bookkeeping live in the `service` crate.

pub mod errors;
pub mod business;
pub mod category;
pub mod service_area;
pub mod coupon;
pub mod job;
pub mod ad_design;
pub mod zip;
pub mod review;
pub mod analytics;

pub use business::{Business, RegisterBusinessInput, UpdateBusinessInput};
pub use category::{CategorySelection, CategorySuggestion, CategorySuggestionInput};
pub use service_area::ServiceArea;
pub use coupon::{Coupon, CouponSize};
pub use job::{FormattedJob, JobListing, JobListingInput, PayType};
pub use ad_design::{AdDesign, BusinessInfo};
pub use zip::{ImportStats, ZipCodeRecord, ZipDistance};
pub use review::{RatingSummary, Review, ReviewRatings, ReviewSubmission};
pub use analytics::{AnalyticsEvent, AnalyticsEventType, BusinessAnalytics, ZipCodeAnalytics};
