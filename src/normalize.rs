//! Field-name heuristics that turn a loose [`ProductRecord`] into a
//! [`NormalizedProduct`].
//!
//! Each attribute has an ordered list of candidate source field names (case and
//! naming-convention variants); the first candidate that yields a usable value
//! wins. Normalization never fails: every attribute has a default.

use crate::record::{FieldValue, ProductRecord};
use crc32fast::Hasher as Crc32;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const DEFAULT_CATEGORY: &str = "General";

const ID_FIELDS: &[&str] = &["id", "Id", "ID"];

#[rustfmt::skip]
const NAME_FIELDS: &[&str] = &[
    "name", "Name", "NAME",
    "title", "Title", "TITLE",
    "product_name", "productName", "ProductName", "PRODUCT_NAME",
    "item_name", "itemName", "ItemName", "ITEM_NAME",
    "product_title", "productTitle", "ProductTitle", "PRODUCT_TITLE",
    "item_title", "itemTitle", "ItemTitle", "ITEM_TITLE",
    "display_name", "displayName", "DisplayName", "DISPLAY_NAME",
    "label", "Label", "LABEL",
    "book_title", "bookTitle", "BookTitle", "BOOK_TITLE",
    "movie_title", "movieTitle", "MovieTitle", "MOVIE_TITLE",
    "product", "Product", "PRODUCT",
    "item", "Item", "ITEM",
    "Product Name", "Product Title", "Item Name", "Item Title",
    "Book Title", "Movie Title", "Display Name",
    // descriptions sometimes carry the only human-readable name
    "description", "Description", "DESCRIPTION",
];

#[rustfmt::skip]
const CATEGORY_FIELDS: &[&str] = &[
    "category", "Category", "CATEGORY",
    "type", "Type", "TYPE",
    "group", "Group", "GROUP",
    "categories", "Categories", "CATEGORIES",
    "genre", "Genre", "GENRE",
    "classification", "Classification", "CLASSIFICATION",
    "Category Name", "Product Category", "Item Category",
    "product_category", "productCategory", "ProductCategory",
    "item_category", "itemCategory", "ItemCategory",
];

#[rustfmt::skip]
const DESCRIPTION_FIELDS: &[&str] = &[
    "description", "Description", "DESCRIPTION",
    "desc", "Desc", "DESC",
    "details", "Details", "DETAILS",
    "summary", "Summary", "SUMMARY",
    "info", "Info", "INFO",
    "Product Description", "Item Description",
    "product_description", "productDescription", "ProductDescription",
    "item_description", "itemDescription", "ItemDescription",
    "about", "About", "ABOUT",
];

#[rustfmt::skip]
const IMAGE_FIELDS: &[&str] = &[
    "image", "Image", "IMAGE",
    "img", "Img", "IMG",
    "imageUrl", "image_url", "ImageUrl", "IMAGE_URL",
    "picture", "Picture", "PICTURE",
    "photo", "Photo", "PHOTO",
    "thumbnail", "Thumbnail", "THUMBNAIL",
    "src", "Src", "SRC",
    "url", "Url", "URL",
    "base64", "Base64", "BASE64",
    "imageData", "image_data", "ImageData", "IMAGE_DATA",
    "data", "Data", "DATA",
    "Product Image", "Item Image",
    "product_image", "productImage", "ProductImage",
    "item_image", "itemImage", "ItemImage",
];

#[rustfmt::skip]
const PRICE_FIELDS: &[&str] = &[
    "price", "Price", "PRICE",
    "cost", "Cost", "COST",
    "amount", "Amount", "AMOUNT",
    "value", "Value", "VALUE",
    "Product Price", "Item Price",
    "product_price", "productPrice", "ProductPrice",
    "item_price", "itemPrice", "ItemPrice",
    "unit_price", "unitPrice", "UnitPrice",
];

#[rustfmt::skip]
const POPULARITY_FIELDS: &[&str] = &[
    "popularity", "Popularity", "POPULARITY",
    "rating", "Rating", "RATING",
    "score", "Score", "SCORE",
    "likes", "Likes", "LIKES",
    "past_purchase_count", "pastPurchaseCount", "PastPurchaseCount",
    "purchase_count", "purchaseCount", "PurchaseCount",
    "views", "Views", "VIEWS",
    "Product Rating", "Item Rating",
    "product_rating", "productRating", "ProductRating",
    "item_rating", "itemRating", "ItemRating",
];

#[rustfmt::skip]
const FEEDBACK_FIELDS: &[&str] = &[
    "feedback", "Feedback", "FEEDBACK",
    "reviews", "Reviews", "REVIEWS",
    "votes", "Votes", "VOTES",
    "net_feedback", "netFeedback", "NetFeedback", "NET_FEEDBACK",
    "positive_reviews", "positiveReviews", "PositiveReviews",
    "review_score", "reviewScore", "ReviewScore", "REVIEW_SCORE",
    "thumbs_up", "thumbsUp", "ThumbsUp", "THUMBS_UP",
    "Product Reviews", "Item Reviews",
    "product_reviews", "productReviews", "ProductReviews",
    "item_reviews", "itemReviews", "ItemReviews",
];

static BASE64_ALPHABET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("static regex"));
static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("static regex")
});
static INT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+").expect("static regex"));

const CATEGORY_DELIMITERS: &[char] = &['|', '>', '/', '\\', ',', ';'];

/// Semantic attributes of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Id,
    Name,
    Description,
    Category,
    Image,
    Price,
    Popularity,
    NetFeedback,
}

/// One rule of the table: which source fields may carry an attribute, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub attribute: Attribute,
    pub candidates: &'static [&'static str],
}

#[rustfmt::skip]
pub const RULES: &[FieldRule] = &[
    FieldRule { attribute: Attribute::Id, candidates: ID_FIELDS },
    FieldRule { attribute: Attribute::Name, candidates: NAME_FIELDS },
    FieldRule { attribute: Attribute::Description, candidates: DESCRIPTION_FIELDS },
    FieldRule { attribute: Attribute::Category, candidates: CATEGORY_FIELDS },
    FieldRule { attribute: Attribute::Image, candidates: IMAGE_FIELDS },
    FieldRule { attribute: Attribute::Price, candidates: PRICE_FIELDS },
    FieldRule { attribute: Attribute::Popularity, candidates: POPULARITY_FIELDS },
    FieldRule { attribute: Attribute::NetFeedback, candidates: FEEDBACK_FIELDS },
];

impl Attribute {
    pub fn candidates(self) -> &'static [&'static str] {
        RULES
            .iter()
            .find(|rule| rule.attribute == self)
            .map(|rule| rule.candidates)
            .unwrap_or(&[])
    }

    fn tag(self) -> &'static [u8] {
        match self {
            Self::Id => b"id",
            Self::Name => b"name",
            Self::Description => b"description",
            Self::Category => b"category",
            Self::Image => b"image",
            Self::Price => b"price",
            Self::Popularity => b"popularity",
            Self::NetFeedback => b"net_feedback",
        }
    }
}

/// A value found by [`resolve`], with the field it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub field: &'static str,
    pub value: T,
}

/// Walk an attribute's candidates in order and return the first one `extract` accepts.
pub fn resolve<T>(
    record: &ProductRecord,
    attribute: Attribute,
    extract: impl Fn(&FieldValue) -> Option<T>,
) -> Option<Resolved<T>> {
    attribute.candidates().iter().find_map(|&field| {
        record
            .get(field)
            .and_then(&extract)
            .map(|value| Resolved { field, value })
    })
}

/// Non-empty text, trimmed. Numbers do not count as text.
pub fn extract_text(value: &FieldValue) -> Option<String> {
    let trimmed = value.as_text()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn extract_id(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(_) => extract_text(value),
        FieldValue::Number(n) if *n != 0.0 && n.is_finite() => Some(format_number(*n)),
        _ => None,
    }
}

fn extract_categories(value: &FieldValue) -> Option<Vec<String>> {
    let text = extract_text(value)?;
    let categories: Vec<String> = text
        .split(CATEGORY_DELIMITERS)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    (!categories.is_empty()).then_some(categories)
}

/// Image values: data URIs and http(s) URLs pass through, bare base64 blobs are
/// wrapped as JPEG data URIs, anything else is rejected.
pub fn classify_image(value: &FieldValue) -> Option<String> {
    let raw = value.as_text()?;
    if raw.trim().is_empty() {
        return None;
    }
    if raw.starts_with("data:image/") || raw.starts_with("http") {
        return Some(raw.to_string());
    }
    if raw.len() > 100 && BASE64_ALPHABET.is_match(raw) {
        return Some(format!("data:image/jpeg;base64,{raw}"));
    }
    None
}

fn numeric(value: &FieldValue, parse: fn(&str) -> Option<f64>) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => parse(s),
        FieldValue::Null => None,
    }
    .filter(|n| n.is_finite())
}

/// Longest leading decimal literal, ignoring leading whitespace (`"12.5 USD"` -> 12.5).
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    FLOAT_PREFIX
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse().ok())
}

/// Longest leading integer literal (`"12.9"` -> 12, `"1e3"` -> 1).
pub fn parse_int_prefix(s: &str) -> Option<f64> {
    INT_PREFIX
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(|n| n as f64)
}

fn extract_price(value: &FieldValue) -> Option<f64> {
    numeric(value, parse_float_prefix).filter(|p| *p > 0.0)
}

fn extract_popularity(value: &FieldValue) -> Option<i64> {
    // half-up rounding: 2.5 -> 3, -2.5 -> -2
    numeric(value, parse_float_prefix).map(|p| (p + 0.5).floor() as i64)
}

fn extract_feedback(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        _ => numeric(value, parse_int_prefix).map(|n| n as i64),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Second-chance name: the first text field that reads like prose rather than a
/// URL, blob or identifier.
fn guess_name(record: &ProductRecord) -> Option<String> {
    record.fields.iter().find_map(|(key, value)| {
        let raw = value.as_text()?;
        if raw.trim().is_empty() {
            return None;
        }
        let chars = raw.chars().count();
        let key = key.to_lowercase();
        let plausible = chars > 2
            && chars < 200
            && !raw.starts_with("http")
            && !raw.starts_with("data:")
            && !BASE64_ALPHABET.is_match(raw)
            && !raw.contains("base64")
            && !key.contains("image")
            && !key.contains("url")
            && !key.contains("id");
        plausible.then(|| raw.trim().to_string())
    })
}

/// Half-open `[min, max)` range for synthesized values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: i64,
    pub max: i64,
}

impl Span {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min < self.max
    }

    fn pick(&self, seed: u32) -> i64 {
        let width = self.max.abs_diff(self.min).max(1);
        self.min + (u64::from(seed) % width) as i64
    }
}

/// Ranges for values a source did not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticRanges {
    pub price: Span,
    pub popularity: Span,
    pub net_feedback: Span,
}

impl Default for SyntheticRanges {
    fn default() -> Self {
        Self {
            price: Span::new(20, 120),
            popularity: Span::new(100, 1100),
            net_feedback: Span::new(50, 250),
        }
    }
}

/// The fixed product shape served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub categories: Vec<String>,
    pub image: Option<String>,
    pub price: f64,
    pub popularity: i64,
    pub net_feedback: i64,
    #[serde(rename = "originalIndex")]
    pub original_index: usize,
    #[serde(rename = "dataSource")]
    pub data_source: String,
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    ranges: SyntheticRanges,
}

impl Normalizer {
    pub fn new(ranges: SyntheticRanges) -> Self {
        Self { ranges }
    }

    /// Normalize one record. `id_prefix` names synthesized ids (`{id_prefix}-{index}`).
    pub fn normalize(&self, record: &ProductRecord, index: usize, id_prefix: &str) -> NormalizedProduct {
        let id = resolve(record, Attribute::Id, extract_id)
            .map(|r| r.value)
            .unwrap_or_else(|| format!("{id_prefix}-{index}"));

        let name = match resolve(record, Attribute::Name, extract_text) {
            Some(found) => found.value,
            None => guess_name(record).unwrap_or_else(|| format!("Product {}", index + 1)),
        };

        let description = resolve(record, Attribute::Description, extract_text)
            .map(|r| r.value)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        let categories = resolve(record, Attribute::Category, extract_categories)
            .map(|r| r.value)
            .unwrap_or_else(|| vec![DEFAULT_CATEGORY.to_string()]);

        let image = resolve(record, Attribute::Image, classify_image).map(|r| r.value);

        let price = resolve(record, Attribute::Price, extract_price)
            .map(|r| r.value)
            .unwrap_or_else(|| self.synthesize(record, index, Attribute::Price) as f64);
        let popularity = resolve(record, Attribute::Popularity, extract_popularity)
            .map(|r| r.value)
            .unwrap_or_else(|| self.synthesize(record, index, Attribute::Popularity));
        let net_feedback = resolve(record, Attribute::NetFeedback, extract_feedback)
            .map(|r| r.value)
            .unwrap_or_else(|| self.synthesize(record, index, Attribute::NetFeedback));

        NormalizedProduct {
            id,
            name,
            description,
            category: categories[0].clone(),
            categories,
            image,
            price,
            popularity,
            net_feedback,
            original_index: record.original_index,
            data_source: String::new(),
        }
    }

    /// Normalize a whole batch from one source, keeping ids unique within it.
    pub fn normalize_batch(
        &self,
        records: &[ProductRecord],
        id_prefix: &str,
        data_source: &str,
    ) -> Vec<NormalizedProduct> {
        let mut seen = HashSet::with_capacity(records.len());
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let mut product = self.normalize(record, index, id_prefix);
                if !seen.insert(product.id.clone()) {
                    let mut suffix = index;
                    let mut unique = format!("{}-{suffix}", product.id);
                    while !seen.insert(unique.clone()) {
                        suffix += 1;
                        unique = format!("{}-{suffix}", product.id);
                    }
                    debug!(id = %product.id, %unique, "duplicate product id");
                    product.id = unique;
                }
                product.data_source = data_source.to_string();
                product
            })
            .collect()
    }

    /// Deterministic stand-in for a missing numeric attribute: the same record
    /// at the same position always gets the same value.
    fn synthesize(&self, record: &ProductRecord, index: usize, attribute: Attribute) -> i64 {
        let span = match attribute {
            Attribute::Price => self.ranges.price,
            Attribute::Popularity => self.ranges.popularity,
            _ => self.ranges.net_feedback,
        };
        let mut hasher = Crc32::new();
        hasher.update(attribute.tag());
        hasher.update(&(index as u64).to_le_bytes());
        for (key, value) in &record.fields {
            hasher.update(key.as_bytes());
            hasher.update(&[0x1f]);
            match value {
                FieldValue::Text(s) => hasher.update(s.as_bytes()),
                FieldValue::Number(n) => hasher.update(&n.to_le_bytes()),
                FieldValue::Null => {}
            }
            hasher.update(&[0x1e]);
        }
        span.pick(hasher.finalize())
    }
}

/// Normalize with default ranges; synthesized ids look like `product-{index}`.
pub fn normalize(record: &ProductRecord, index: usize) -> NormalizedProduct {
    Normalizer::default().normalize(record, index, "product")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec() -> ProductRecord {
        ProductRecord::new(0)
    }

    #[test]
    fn empty_record_is_fully_populated() {
        let p = normalize(&rec(), 4);
        assert_eq!(p.id, "product-4");
        assert_eq!(p.name, "Product 5");
        assert_eq!(p.description, DEFAULT_DESCRIPTION);
        assert_eq!(p.category, DEFAULT_CATEGORY);
        assert_eq!(p.categories, vec![DEFAULT_CATEGORY]);
        assert_eq!(p.image, None);
        assert!(p.price >= 20.0 && p.price < 120.0);
        assert!((100..1100).contains(&p.popularity));
        assert!((50..250).contains(&p.net_feedback));
    }

    #[test]
    fn synthesized_values_are_deterministic() {
        let r = rec().with("title", "Lamp");
        assert_eq!(normalize(&r, 3), normalize(&r, 3));
    }

    #[test]
    fn every_rule_candidate_is_reachable() {
        for rule in RULES {
            for &field in rule.candidates {
                let r = rec().with(field, "7");
                let found = resolve(&r, rule.attribute, |v| v.as_text().map(str::to_string));
                assert_eq!(found.map(|f| f.field), Some(field), "{:?} {field}", rule.attribute);
            }
        }
    }

    #[test]
    fn earlier_candidates_win() {
        let r = rec().with("Title", "Second").with("name", "First");
        assert_eq!(normalize(&r, 0).name, "First");
    }

    #[test]
    fn naming_conventions_resolve() {
        let r = rec()
            .with("Product Name", "Desk Lamp")
            .with("productDescription", "Warm light")
            .with("unit_price", "12.50")
            .with("PastPurchaseCount", "41.6")
            .with("THUMBS_UP", "17");
        let p = normalize(&r, 0);
        assert_eq!(p.name, "Desk Lamp");
        assert_eq!(p.description, "Warm light");
        assert_eq!(p.price, 12.5);
        assert_eq!(p.popularity, 42);
        assert_eq!(p.net_feedback, 17);
    }

    #[test]
    fn blank_candidates_fall_through() {
        let r = rec().with("name", "   ").with("title", "Real");
        assert_eq!(normalize(&r, 0).name, "Real");
    }

    #[test]
    fn name_guess_skips_urls_blobs_and_ids() {
        let r = rec()
            .with("sku_id", "Some text id")
            .with("link", "https://example.com/p/1")
            .with("code", "ABC123")
            .with("blurb", "Hand-thrown stoneware mug");
        assert_eq!(normalize(&r, 0).name, "Hand-thrown stoneware mug");
    }

    #[test]
    fn name_guess_respects_length_bounds() {
        let r = rec().with("x", "ab").with("y", "z".repeat(250) + " tail");
        assert_eq!(normalize(&r, 1).name, "Product 2");
    }

    #[test]
    fn numbers_are_not_names() {
        let r = rec().with("name", 42.0);
        assert_eq!(normalize(&r, 0).name, "Product 1");
    }

    #[test]
    fn categories_split_on_every_delimiter() {
        let r = rec().with("category", "Home | Kitchen > Mugs / Tea\\Cups, Gifts; ;");
        let p = normalize(&r, 0);
        assert_eq!(p.categories, vec!["Home", "Kitchen", "Mugs", "Tea", "Cups", "Gifts"]);
        assert_eq!(p.category, "Home");
    }

    #[test]
    fn image_classification() {
        let blob = "A".repeat(120);
        assert_eq!(
            classify_image(&FieldValue::from(blob.as_str())),
            Some(format!("data:image/jpeg;base64,{blob}"))
        );
        assert_eq!(
            classify_image(&FieldValue::from("data:image/png;base64,xyz")),
            Some("data:image/png;base64,xyz".into())
        );
        assert_eq!(
            classify_image(&FieldValue::from("https://cdn.example.com/a.jpg")),
            Some("https://cdn.example.com/a.jpg".into())
        );
        assert_eq!(classify_image(&FieldValue::from("A".repeat(50).as_str())), None);
        assert_eq!(classify_image(&FieldValue::from("not an image")), None);
    }

    #[test]
    fn unusable_image_candidates_fall_through() {
        let r = rec().with("image", "n/a").with("thumbnail", "http://x/y.png");
        assert_eq!(normalize(&r, 0).image.as_deref(), Some("http://x/y.png"));
    }

    #[test]
    fn price_must_be_positive() {
        let r = rec().with("price", "0").with("cost", "-3").with("amount", "$9").with("value", "19.99 USD");
        assert_eq!(normalize(&r, 0).price, 19.99);
    }

    #[test]
    fn feedback_uses_integer_prefix() {
        let r = rec().with("feedback", "12.9");
        assert_eq!(normalize(&r, 0).net_feedback, 12);
        let r = rec().with("votes", -7.8);
        assert_eq!(normalize(&r, 0).net_feedback, -7);
    }

    #[test]
    fn numeric_ids_are_kept() {
        let r = rec().with("ID", 1042.0);
        assert_eq!(normalize(&r, 0).id, "1042");
    }

    #[test]
    fn batch_ids_stay_unique() {
        let records = vec![
            ProductRecord::new(0).with("id", "dup"),
            ProductRecord::new(1).with("id", "dup"),
            ProductRecord::new(2),
        ];
        let products = Normalizer::default().normalize_batch(&records, "csv-product", "Test");
        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["dup", "dup-1", "csv-product-2"]);
        assert!(products.iter().all(|p| p.data_source == "Test"));

        let records = vec![
            ProductRecord::new(0).with("id", "a"),
            ProductRecord::new(1).with("id", "a-2"),
            ProductRecord::new(2).with("id", "a"),
        ];
        let products = Normalizer::default().normalize_batch(&records, "csv-product", "Test");
        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "a-2", "a-3"]);
    }

    #[test]
    fn prefix_parsers_follow_leading_digits() {
        assert_eq!(parse_float_prefix("  3.5kg"), Some(3.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_int_prefix("1e3"), Some(1.0));
        assert_eq!(parse_int_prefix("-12.9"), Some(-12.0));
    }

    #[test]
    fn configured_ranges_bound_synthesized_values() {
        let ranges = SyntheticRanges {
            price: Span::new(5, 6),
            popularity: Span::new(0, 1),
            net_feedback: Span::new(-1, 0),
        };
        let p = Normalizer::new(ranges).normalize(&rec(), 0, "x");
        assert_eq!(p.price, 5.0);
        assert_eq!(p.popularity, 0);
        assert_eq!(p.net_feedback, -1);
    }

    #[test]
    fn extreme_ranges_do_not_overflow() {
        let ranges = SyntheticRanges {
            price: Span::new(1, i64::MAX),
            popularity: Span::new(i64::MIN, i64::MAX),
            net_feedback: Span::new(i64::MIN, i64::MIN + 1),
        };
        let p = Normalizer::new(ranges).normalize(&rec(), 3, "x");
        assert!(p.price >= 1.0);
        assert!(p.popularity < i64::MAX);
        assert_eq!(p.net_feedback, i64::MIN);
    }
}
