//! Category names, landing pages and the heuristics that connect them.

/// Landing page path to the category name the page lists.
const PAGE_CATEGORIES: &[(&str, &str)] = &[
    ("/home-improvement", "Home, Lawn, and Manual Labor"),
    ("/home-improvement/lawn-garden", "Lawn, Garden and Snow Removal"),
    ("/home-improvement/outside-maintenance", "Outside Home Maintenance and Repair"),
    ("/home-improvement/outdoor-structures", "Outdoor Structure Assembly/Construction and Fencing"),
    ("/home-improvement/pool-services", "Pool Services"),
    ("/home-improvement/asphalt-concrete", "Asphalt, Concrete, Stone and Gravel"),
    ("/home-improvement/construction-design", "Home Construction and Design"),
    ("/home-improvement/inside-maintenance", "Inside Home Maintenance and Repair"),
    ("/home-improvement/windows-doors", "Windows and Doors"),
    ("/home-improvement/flooring", "Floor/Carpet Care and Installation"),
    ("/home-improvement/audio-visual-security", "Audio/Visual and Home Security"),
    ("/home-improvement/hazard-mitigation", "Home Hazard Mitigation"),
    ("/home-improvement/pest-control", "Pest Control/ Wildlife Removal"),
    ("/home-improvement/trash-cleanup", "Trash Cleanup and Removal"),
    ("/home-improvement/cleaning", "Home and Office Cleaning"),
    ("/home-improvement/fireplaces-chimneys", "Fireplaces and Chimneys"),
    ("/home-improvement/movers", "Movers/Moving Trucks"),
    ("/home-improvement/handymen", "Handymen"),
    ("/retail-stores", "Retail Stores"),
    ("/travel-vacation", "Travel and Vacation"),
    ("/tailoring-clothing", "Tailors, Dressmakers, and Fabric and Clothes Cleaning and Repair"),
    ("/arts-entertainment", "Art, Design and Entertainment"),
    ("/physical-rehabilitation", "Physical Rehabilitation"),
    ("/financial-services", "Insurance, Finance, Debt and Sales"),
    ("/weddings-events", "Weddings and Special Events"),
    ("/pet-care", "Pet Care"),
    ("/education-tutoring", "Language Lessons/School Subject Tutoring"),
    ("/real-estate", "Home Buying and Selling"),
    ("/fitness-athletics", "Athletics, Personal Trainers, Group Fitness Classes and Dance Instruction"),
    ("/music-lessons", "Music"),
    ("/care-services", "Home Care"),
    ("/automotive-services", "Automotive/Motorcycle/RV, etc"),
    ("/beauty-wellness", "Hair care, Beauty, Tattoo and Piercing"),
    ("/medical-practitioners", "Medical Practitioners - non MD/DO"),
    ("/mental-health", "Counselors, Psychologists, Addiction Specialists, Team Building"),
    ("/tech-it-services", "Computers and the Web"),
    ("/food-dining", "Restaurant, Food and Drink"),
    ("/personal-assistants", "Assistants"),
    ("/funeral-services", "Mortuary Services"),
    ("/legal-services", "Lawyers"),
];

/// Category name (and legacy spellings) to page slug. Order matters for substring matching.
const CATEGORY_ROUTES: &[(&str, &str)] = &[
    ("Insurance, Finance, Debt and Sales", "financial-services"),
    ("Financial Services", "financial-services"),
    ("Finance & Insurance", "financial-services"),
    ("financeInsurance", "financial-services"),
    ("Automotive Services", "automotive-services"),
    ("Automotive/Motorcycle/RV", "automotive-services"),
    ("automotive", "automotive-services"),
    ("Art, Design and Entertainment", "arts-entertainment"),
    ("Arts & Entertainment", "arts-entertainment"),
    ("artDesignEntertainment", "arts-entertainment"),
    ("Home, Lawn, and Manual Labor", "home-improvement"),
    ("homeLawnLabor", "home-improvement"),
    ("Real Estate", "real-estate"),
    ("Care Services", "care-services"),
    ("Pet Care", "pet-care"),
    ("Weddings & Events", "weddings-events"),
    ("Education & Tutoring", "education-tutoring"),
    ("Tailoring & Clothing", "tailoring-clothing"),
    ("Travel & Vacation", "travel-vacation"),
    ("Tech & IT Services", "tech-it-services"),
    ("Beauty & Wellness", "beauty-wellness"),
    ("Physical Rehabilitation", "physical-rehabilitation"),
    ("Medical Practitioners", "medical-practitioners"),
    ("Mental Health", "mental-health"),
    ("Food & Dining", "food-dining"),
    ("Fitness & Athletics", "fitness-athletics"),
    ("Child Care", "child-care"),
    ("Personal Assistants", "personal-assistants"),
    ("Legal Services", "legal-services"),
    ("Retail Stores", "retail-stores"),
    ("Funeral Services", "funeral-services"),
    ("Elder Care", "elder-care"),
    ("Music Lessons", "music-lessons"),
];

const FINANCE_WORDS: &[&str] = &["finance", "insurance", "financial", "debt", "investment"];
const HOME_WORDS: &[&str] = &["home", "lawn", "garden", "construction", "repair", "maintenance"];

/// Alternate spellings of a category, matched case-insensitively, to the canonical name.
const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("mortuaryServices", "Mortuary Services"),
    ("mortuary-services", "Mortuary Services"),
    ("mortuary_services", "Mortuary Services"),
    ("funeral-services", "Mortuary Services"),
    ("funeral_services", "Mortuary Services"),
    ("funeralServices", "Mortuary Services"),
    ("artDesignEntertainment", "Arts & Entertainment"),
    ("art-design-entertainment", "Arts & Entertainment"),
    ("arts-entertainment", "Arts & Entertainment"),
    ("arts-&-entertainment", "Arts & Entertainment"),
    ("art-design-and-entertainment", "Arts & Entertainment"),
    ("automotive", "Automotive Services"),
    ("automotive-services", "Automotive Services"),
    ("automotiveServices", "Automotive Services"),
    ("auto-services", "Automotive Services"),
    ("autoServices", "Automotive Services"),
    ("automotive/motorcycle/rv", "Automotive Services"),
    ("automotive-motorcycle-rv", "Automotive Services"),
    ("Automotive/Motorcycle/RV, etc", "Automotive Services"),
    ("Automotive/Motorcycle/RV etc", "Automotive Services"),
];

/// Legacy spellings under which finance businesses were indexed.
pub const FINANCE_CATEGORY_SPELLINGS: &[&str] = &[
    "financeInsurance",
    "finance-insurance",
    "finance_insurance",
    "financial-services",
    "financial_services",
    "financialServices",
    "Insurance, Finance, Debt and Sales",
    "Financial Services",
    "Finance & Insurance",
];

pub const FINANCIAL_SERVICES: &str = "financial-services";

fn normalize_path(path: &str) -> String {
    path.trim().to_lowercase()
}

/// Category name a landing page lists.
pub fn category_for_page(path: &str) -> Option<&'static str> {
    let path = normalize_path(path);
    PAGE_CATEGORIES.iter().find(|(p, _)| *p == path).map(|(_, name)| *name)
}

/// Landing page for an exact category name.
pub fn page_for_category(name: &str) -> Option<&'static str> {
    let name = name.trim();
    PAGE_CATEGORIES.iter().find(|(_, n)| *n == name).map(|(p, _)| *p)
}

pub fn has_page(path: &str) -> bool {
    category_for_page(path).is_some()
}

pub fn page_mappings() -> impl Iterator<Item = (&'static str, &'static str)> {
    PAGE_CATEGORIES.iter().copied()
}

/// Page slug a business with primary category `name` belongs on.
///
/// Exact table match, then any table key contained in the name
/// (case-insensitive, table order), then finance and home keyword fallbacks.
pub fn category_route(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return None;
    }
    if let Some(&(_, slug)) = CATEGORY_ROUTES.iter().find(|(k, _)| *k == name) {
        return Some(slug);
    }
    let lower = name.to_lowercase();
    if let Some(&(_, slug)) = CATEGORY_ROUTES.iter().find(|(k, _)| lower.contains(&k.to_lowercase())) {
        return Some(slug);
    }
    if FINANCE_WORDS.iter().any(|w| lower.contains(w)) {
        return Some(FINANCIAL_SERVICES);
    }
    if HOME_WORDS.iter().any(|w| lower.contains(w)) {
        return Some("home-improvement");
    }
    None
}

/// Canonical name for a known alternate spelling.
pub fn canonical_category(name: &str) -> Option<&'static str> {
    let name = name.trim();
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, canonical)| *canonical)
}

/// Spellings a category may have been indexed under, most specific first, deduplicated.
pub fn category_lookup_variants(name: &str) -> Vec<String> {
    let words: Vec<&str> = name.split_whitespace().collect();
    let candidates = [
        name.to_string(),
        canonical_category(name).unwrap_or(name).to_string(),
        name.to_lowercase(),
        words.concat(),
        words.join("-"),
        words.join("_"),
    ];
    let mut out: Vec<String> = Vec::new();
    for c in candidates {
        if !c.is_empty() && !out.contains(&c) {
            out.push(c);
        }
    }
    out
}
