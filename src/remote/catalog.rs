//! Built-in product catalog used when running offline.

use crate::error::Result;
use crate::identifier::Identifier;
use crate::models::{
    Nutrition, ProcessingLevel, ProductRecord, Recommendation, RecommendationKind,
    Sustainability, DEFAULT_IMAGE,
};
use crate::remote::RemoteDataSource;

pub const QUINOA_CHIPS: &str = "5901234123457";
pub const DARK_CHOCOLATE: &str = "4001724819906";
pub const PROTEIN_SMOOTHIE: &str = "7896548798765";
pub const GOODDAY_CHOCO_CHIP: &str = "8901063004122";

/// Candidates per kind, in preference order, with the reason shown for each.
const CANDIDATES: &[(RecommendationKind, &str, &str)] = &[
    (
        RecommendationKind::Healthier,
        QUINOA_CHIPS,
        "Lower calories and higher nutritional value",
    ),
    (
        RecommendationKind::Healthier,
        PROTEIN_SMOOTHIE,
        "Fewer calories with far more protein",
    ),
    (
        RecommendationKind::Healthier,
        DARK_CHOCOLATE,
        "Less sugar per serving",
    ),
    (
        RecommendationKind::Similar,
        PROTEIN_SMOOTHIE,
        "Similar protein content and health-focused brand",
    ),
    (
        RecommendationKind::Similar,
        QUINOA_CHIPS,
        "Similar snack with a short ingredient list",
    ),
    (
        RecommendationKind::Similar,
        DARK_CHOCOLATE,
        "Similar snack size and price range",
    ),
    (
        RecommendationKind::Alternative,
        DARK_CHOCOLATE,
        "Indulgent option with potential antioxidant benefits",
    ),
    (
        RecommendationKind::Alternative,
        GOODDAY_CHOCO_CHIP,
        "Classic sweet treat for the same craving",
    ),
    (
        RecommendationKind::Alternative,
        QUINOA_CHIPS,
        "Savory option when you want something crunchy",
    ),
];

/// A fixed set of known products with recommendation candidates.
///
/// Every recommendation list returned here contains candidates for all
/// three kinds; the input product itself may appear among them and is
/// filtered out by the recommendation generator.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    products: Vec<ProductRecord>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            products: builtin_products(),
        }
    }

    /// Catalog over an arbitrary product list. Recommendation candidates
    /// are still drawn from the built-in table, so only built-in barcodes
    /// present in `products` will ever be recommended.
    pub fn with_products(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn find(&self, id: &Identifier) -> Option<&ProductRecord> {
        self.products.iter().find(|p| p.barcode == *id)
    }
}

impl RemoteDataSource for MockCatalog {
    fn fetch_product(&self, id: &Identifier) -> Result<Option<ProductRecord>> {
        Ok(self.find(id).cloned())
    }

    fn fetch_recommendations(&self, id: &Identifier) -> Result<Option<Vec<Recommendation>>> {
        if self.find(id).is_none() {
            return Ok(None);
        }
        let recs = CANDIDATES
            .iter()
            .filter_map(|(kind, barcode, reason)| {
                self.products
                    .iter()
                    .find(|p| p.barcode.as_str() == *barcode)
                    .map(|product| Recommendation {
                        kind: *kind,
                        product: product.clone(),
                        reason: reason.to_string(),
                    })
            })
            .collect();
        Ok(Some(recs))
    }
}

struct Entry<'a> {
    barcode: &'a str,
    name: &'a str,
    brand: &'a str,
    grade: &'a str,
    nutrition: [f64; 6],
    ingredients: &'a [&'a str],
    sustainability: (f64, f64, f64, u8),
}

fn build(entry: Entry<'_>) -> Option<ProductRecord> {
    let [calories, protein, carbs, fat, sugars, saturated_fat] = entry.nutrition;
    let (carbon_footprint, packaging_score, water_usage, eco_score) = entry.sustainability;
    Some(ProductRecord {
        barcode: Identifier::parse(entry.barcode).ok()?,
        name: entry.name.to_string(),
        brand: entry.brand.to_string(),
        grade: entry.grade.to_string(),
        nutrition: Nutrition {
            calories,
            protein,
            carbs,
            fat,
            sugars,
            saturated_fat,
        },
        sustainability: Sustainability {
            carbon_footprint,
            packaging_score,
            water_usage,
            eco_score,
        },
        ingredients: entry.ingredients.iter().map(|s| s.to_string()).collect(),
        image_url: Some(DEFAULT_IMAGE.to_string()),
        allergens: Vec::new(),
        labels: Vec::new(),
        category: None,
        origin: None,
        processing_level: None,
        packaging: None,
        nutrition_grade_raw: None,
        cached_at: None,
    })
}

fn builtin_products() -> Vec<ProductRecord> {
    let mut products: Vec<ProductRecord> = [
        Entry {
            barcode: QUINOA_CHIPS,
            name: "Organic Quinoa Chips",
            brand: "HealthySnacks Co.",
            grade: "A",
            nutrition: [120.0, 4.0, 15.0, 5.0, 2.0, 1.0],
            ingredients: &["Quinoa", "Sea Salt", "Olive Oil"],
            sustainability: (0.5, 4.0, 20.0, 80),
        },
        Entry {
            barcode: DARK_CHOCOLATE,
            name: "Dark Chocolate Bar",
            brand: "Pure Indulgence",
            grade: "B",
            nutrition: [180.0, 2.0, 20.0, 12.0, 15.0, 7.0],
            ingredients: &["Cocoa Mass", "Sugar", "Cocoa Butter"],
            sustainability: (1.2, 3.0, 45.0, 60),
        },
        Entry {
            barcode: PROTEIN_SMOOTHIE,
            name: "Protein Power Smoothie",
            brand: "FitDrink",
            grade: "A-",
            nutrition: [150.0, 20.0, 10.0, 3.0, 5.0, 1.0],
            ingredients: &["Whey Protein", "Banana", "Almond Milk"],
            sustainability: (0.8, 4.0, 35.0, 75),
        },
        Entry {
            barcode: GOODDAY_CHOCO_CHIP,
            name: "GoodDay Choco Chip",
            brand: "Britannia",
            grade: "D",
            nutrition: [493.0, 5.0, 71.0, 21.0, 30.0, 7.5],
            ingredients: &[
                "Refined Wheat Flour",
                "Sugar",
                "Edible Vegetable Oil (Palm)",
                "Chocolate Chips",
                "Cocoa Solids",
                "Dextrose",
                "Emulsifiers",
                "Salt",
                "Natural and Artificial Flavors",
            ],
            sustainability: (5.848, 3.0, 45.0, 32),
        },
    ]
    .into_iter()
    .filter_map(build)
    .collect();

    if let Some(goodday) = products
        .iter_mut()
        .find(|p| p.barcode.as_str() == GOODDAY_CHOCO_CHIP)
    {
        goodday.allergens = vec!["Gluten".to_string()];
        goodday.labels = vec!["Vegetarian".to_string(), "Green Dot India".to_string()];
        goodday.category = Some("Biscuits and Cakes".to_string());
        goodday.origin = Some("India".to_string());
        goodday.processing_level = ProcessingLevel::new(4);
        goodday.packaging = Some("Plastic".to_string());
        goodday.nutrition_grade_raw = Some("unknown".to_string());
    }
    products
}
