//! Well-known merchant category codes used by the built-in templates

pub const GROCERY: &str = "grocery";
pub const RESTAURANT: &str = "restaurant";
pub const CONVENIENCE_STORE: &str = "convenience-store";
pub const BAKERY: &str = "bakery";
pub const PHARMACY: &str = "pharmacy";
pub const HOSPITAL: &str = "hospital";
pub const TRADITIONAL_MARKET: &str = "traditional-market";
pub const BOOKSTORE: &str = "bookstore";
pub const EDUCATION: &str = "education";
pub const CULTURE: &str = "culture";
pub const SPORTS: &str = "sports";
pub const FARM_SUPPLY: &str = "farm-supply";
pub const AGRICULTURAL_EQUIPMENT: &str = "agricultural-equipment";
pub const SEED: &str = "seed";
pub const FERTILIZER: &str = "fertilizer";

pub const LIQUOR_STORE: &str = "liquor-store";
pub const TOBACCO: &str = "tobacco";
pub const GAMBLING: &str = "gambling";
pub const ENTERTAINMENT: &str = "entertainment";
pub const LUXURY: &str = "luxury";
