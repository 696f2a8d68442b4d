//! Built-in sample catalog served when every configured source fails.

use crate::record::ProductRecord;

pub const SAMPLE_SOURCE_LABEL: &str = "Sample Data Fallback";

#[rustfmt::skip]
const SAMPLES: &[(&str, &str, &str, &str, f64, f64, f64)] = &[
    ("sample-1", "Wireless Bluetooth Headphones",
     "Premium noise-cancelling wireless headphones with 30-hour battery life and superior sound quality",
     "Electronics", 199.99, 1250.0, 890.0),
    ("sample-2", "The Great Gatsby - Classic Novel",
     "F. Scott Fitzgerald's timeless masterpiece about the Jazz Age and the American Dream",
     "Books", 12.99, 850.0, 620.0),
    ("sample-3", "Organic Coffee Beans - Premium Blend",
     "Single-origin organic coffee beans, medium roast, ethically sourced from Colombian highlands",
     "Food & Beverage", 24.99, 650.0, 480.0),
    ("sample-4", "Smart Fitness Watch",
     "Advanced fitness tracking with heart rate monitor, GPS, and 7-day battery life",
     "Electronics", 299.99, 980.0, 720.0),
    ("sample-5", "Yoga Mat - Eco-Friendly",
     "Non-slip yoga mat made from natural rubber, 6mm thick, perfect for all yoga styles",
     "Sports & Fitness", 49.99, 420.0, 350.0),
    ("sample-6", "Moisturizing Face Cream",
     "Anti-aging face cream with hyaluronic acid, vitamin C, and natural botanicals",
     "Beauty", 45.99, 380.0, 290.0),
    ("sample-7", "Stainless Steel Water Bottle",
     "Insulated water bottle keeps drinks cold for 24hrs, hot for 12hrs, BPA-free",
     "Home & Kitchen", 34.99, 720.0, 540.0),
    ("sample-8", "Wireless Gaming Mouse",
     "High-precision gaming mouse with RGB lighting, programmable buttons, and ergonomic design",
     "Electronics", 79.99, 1100.0, 780.0),
    ("sample-9", "Organic Green Tea",
     "Premium loose leaf green tea with antioxidants, sourced from Japanese tea gardens",
     "Food & Beverage", 18.99, 560.0, 420.0),
    ("sample-10", "Bluetooth Speaker",
     "Portable waterproof speaker with 360-degree sound and 12-hour battery life",
     "Electronics", 89.99, 890.0, 650.0),
];

/// The sample catalog as raw records, so it goes through the same normalizer as
/// fetched data. Never empty.
pub fn sample_records() -> Vec<ProductRecord> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(index, &(id, name, description, category, price, popularity, feedback))| {
            ProductRecord::new(index)
                .with("id", id)
                .with("name", name)
                .with("description", description)
                .with("category", category)
                .with("price", price)
                .with("popularity", popularity)
                .with("net_feedback", feedback)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;

    #[test]
    fn ten_samples_normalize_verbatim() {
        let records = sample_records();
        assert_eq!(records.len(), 10);

        let products = Normalizer::default().normalize_batch(&records, "sample", SAMPLE_SOURCE_LABEL);
        let first = &products[0];
        assert_eq!(first.id, "sample-1");
        assert_eq!(first.name, "Wireless Bluetooth Headphones");
        assert_eq!(first.price, 199.99);
        assert_eq!(first.popularity, 1250);
        assert_eq!(first.net_feedback, 890);
        // "Food & Beverage" contains no category delimiter
        assert_eq!(products[2].categories, vec!["Food & Beverage"]);
    }
}
