//! Key naming for everything the directory stores.
//!
//! No other module formats store keys by hand.

pub const BUSINESSES: &str = "businesses";
pub const NATIONWIDE_BUSINESSES: &str = "businesses:nationwide";
pub const CATEGORY_SUGGESTIONS: &str = "category:suggestions";
pub const ADMIN_API_KEYS: &str = "admin:apikeys";

const BUSINESS_PREFIX: &str = "business:";
const CATEGORY_PREFIX: &str = "category:";

pub fn business(id: &str) -> String { format!("{BUSINESS_PREFIX}{id}") }
pub fn business_email(email: &str) -> String { format!("{BUSINESS_PREFIX}email:{}", email.trim().to_lowercase()) }
pub fn business_pattern(id: &str) -> String { format!("{BUSINESS_PREFIX}{id}:*") }

fn business_sub(id: &str, suffix: &str) -> String { format!("{BUSINESS_PREFIX}{id}:{suffix}") }
pub fn categories(id: &str) -> String { business_sub(id, "categories") }
pub fn selected_categories(id: &str) -> String { business_sub(id, "selectedCategories") }
pub fn all_categories(id: &str) -> String { business_sub(id, "allCategories") }
pub fn all_subcategories(id: &str) -> String { business_sub(id, "allSubcategories") }
pub fn pages(id: &str) -> String { business_sub(id, "pages") }
pub fn service_area(id: &str) -> String { business_sub(id, "serviceArea") }
pub fn nationwide(id: &str) -> String { business_sub(id, "nationwide") }
pub fn zipcodes(id: &str) -> String { business_sub(id, "zipcodes") }
pub fn keywords(id: &str) -> String { business_sub(id, "keywords") }
pub fn coupons(id: &str) -> String { business_sub(id, "coupons") }
pub fn ad_design(id: &str) -> String { business_sub(id, "adDesign") }
pub fn ad_design_info(id: &str) -> String { business_sub(id, "adDesign:businessInfo") }
pub fn business_reviews(id: &str) -> String { business_sub(id, "reviews") }
/// Cached average rating, one decimal, as a string.
pub fn rating(id: &str) -> String { business_sub(id, "rating") }
pub fn review_count(id: &str) -> String { business_sub(id, "reviewCount") }

pub fn review(review_id: &str) -> String { format!("review:{review_id}") }
pub fn user_reviews(user_id: &str) -> String { format!("user:{user_id}:reviews") }

fn analytics_sub(business_id: &str, suffix: &str) -> String { format!("analytics:{business_id}:{suffix}") }
pub fn analytics_events(business_id: &str) -> String { analytics_sub(business_id, "events") }
pub fn analytics_zipcodes(business_id: &str) -> String { analytics_sub(business_id, "zipcodes") }
pub fn analytics_zip_meta(business_id: &str, zip: &str) -> String { analytics_sub(business_id, &format!("zipmeta:{zip}")) }
pub fn analytics_pattern(business_id: &str) -> String { analytics_sub(business_id, "*") }

/// Set of businesses that selected `name`, spelled as stored.
pub fn category_businesses(name: &str) -> String { format!("{CATEGORY_PREFIX}{name}:businesses") }
/// Bare category set (`category:<name>`), used by the rebuilt normalized index.
pub fn category(name: &str) -> String { format!("{CATEGORY_PREFIX}{name}") }
pub fn category_pattern() -> String { format!("{CATEGORY_PREFIX}*") }
pub fn category_suggestion(id: &str) -> String { format!("{CATEGORY_SUGGESTIONS}:{id}") }
pub fn is_suggestion_key(key: &str) -> bool { key.starts_with(CATEGORY_SUGGESTIONS) }

pub fn page_businesses(slug: &str) -> String { format!("page:{}:businesses", slug.trim_start_matches('/')) }
pub fn zipcode_businesses(zip: &str) -> String { format!("zipcode:{zip}:businesses") }

pub fn jobs(business_id: &str) -> String { format!("jobs:{business_id}") }
pub fn job(business_id: &str, job_id: &str) -> String { format!("job:{business_id}:{job_id}") }

pub fn zip(zip: &str) -> String { format!("zip:{zip}") }
pub fn zip_pattern() -> String { "zip:?????".to_string() }
pub fn zip_state_index(state: &str) -> String { format!("zip:index:state:{}", state.trim().to_uppercase()) }

/// The id of a primary record key (`business:<id>`), `None` for any other key.
pub fn business_id_from_key(key: &str) -> Option<&str> {
    let id = key.strip_prefix(BUSINESS_PREFIX)?;
    (!id.is_empty() && !id.contains(':')).then_some(id)
}

/// Trimmed, lowercased, whitespace runs collapsed to `-`.
pub fn normalize_category_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keys_only() {
        assert_eq!(business_id_from_key("business:abc"), Some("abc"));
        assert_eq!(business_id_from_key("business:abc:pages"), None);
        assert_eq!(business_id_from_key("business:email:a@b.co"), None);
        assert_eq!(business_id_from_key("business:"), None);
        assert_eq!(business_id_from_key("category:abc"), None);
    }

    #[test]
    fn normalized_category_keys() {
        assert_eq!(normalize_category_key("  Pet   Care "), "pet-care");
        assert_eq!(normalize_category_key("Insurance, Finance, Debt and Sales"), "insurance,-finance,-debt-and-sales");
    }

    #[test]
    fn key_shapes() {
        assert_eq!(business_email(" Ada@Example.com"), "business:email:ada@example.com");
        assert_eq!(category_businesses("Pet Care"), "category:Pet Care:businesses");
        assert_eq!(page_businesses("/financial-services"), "page:financial-services:businesses");
        assert_eq!(job("b", "j"), "job:b:j");
        assert_eq!(zip_state_index("tx"), "zip:index:state:TX");
        assert!(is_suggestion_key(&category_suggestion("1")));
        assert_eq!(review_count("b"), "business:b:reviewCount");
        assert_eq!(business_id_from_key(&rating("b")), None);
        assert_eq!(analytics_zip_meta("b", "10001"), "analytics:b:zipmeta:10001");
    }
}
