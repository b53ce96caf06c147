use serde::{Deserialize, Serialize};

/// Visitor interactions counted per business.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    ProfileView,
    ContactClick,
    WebsiteClick,
    PhoneClick,
}

impl AnalyticsEventType {
    /// Counter field name in the events hash.
    pub fn field(self) -> &'static str {
        match self {
            Self::ProfileView => "profile_view",
            Self::ContactClick => "contact_click",
            Self::WebsiteClick => "website_click",
            Self::PhoneClick => "phone_click",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_type: AnalyticsEventType,
    /// Visitor zip; anything but five digits is ignored.
    #[serde(default)]
    pub zip_code: Option<String>,
    /// Milliseconds since the epoch; the server clock is used when absent.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZipCodeAnalytics {
    pub zip_code: String,
    pub count: i64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub last_viewed: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BusinessAnalytics {
    pub business_id: String,
    pub total_events: i64,
    pub profile_views: i64,
    pub contact_clicks: i64,
    pub website_clicks: i64,
    pub phone_clicks: i64,
    /// Most-viewed zip codes first.
    pub zip_code_analytics: Vec<ZipCodeAnalytics>,
}
