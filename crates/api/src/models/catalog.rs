//! Catalog domain types: categories, products, images, variants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use avoi_core::currency::round2;
use avoi_core::{CategoryId, CurrencyCode, ImageId, ProductId, VariantId};

/// A product category. Categories form a tree via `parent_id`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_active: bool,
}

/// A category with its nested subcategories, for the tree endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Assemble a forest of root categories from a flat row list.
    ///
    /// Children whose parent is missing from `categories` (e.g. an
    /// inactive parent) are dropped rather than promoted to roots.
    #[must_use]
    pub fn build_tree(categories: Vec<Category>) -> Vec<Self> {
        let roots: Vec<Category> = categories
            .iter()
            .filter(|c| c.parent_id.is_none())
            .cloned()
            .collect();

        roots
            .into_iter()
            .map(|root| Self::attach_children(root, &categories))
            .collect()
    }

    fn attach_children(category: Category, all: &[Category]) -> Self {
        let subcategories = all
            .iter()
            .filter(|c| c.parent_id == Some(category.id))
            .cloned()
            .map(|child| Self::attach_children(child, all))
            .collect();

        Self {
            category,
            subcategories,
        }
    }
}

/// A product row. `base_price` is in the reference currency (USD).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: String,
    pub base_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub brand: Option<String>,
    pub ingredients: Option<String>,
    pub usage_instructions: Option<String>,
    pub benefits: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub url: String,
    pub alt_text: Option<String>,
    pub position: i32,
    pub is_primary: bool,
}

/// A purchasable variant of a product (e.g. a size), joined with its
/// available quantity.
///
/// `price_adjustment` is a delta applied to the product's base price.
/// Stock lives on the inventory row, never on the variant itself.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantStock {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub price_adjustment: Decimal,
    pub quantity_available: i32,
}

/// A variant priced in a display currency.
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub currency: CurrencyCode,
    pub quantity_available: i32,
}

impl VariantView {
    /// Price a variant: `(base_price + adjustment) * rate`, rounded to 2dp.
    #[must_use]
    pub fn from_stock(
        variant: VariantStock,
        base_price: Decimal,
        rate: Decimal,
        currency: CurrencyCode,
    ) -> Self {
        let price = round2((base_price + variant.price_adjustment) * rate);
        Self {
            id: variant.id,
            product_id: variant.product_id,
            name: variant.name,
            sku: variant.sku,
            price,
            currency,
            quantity_available: variant.quantity_available,
        }
    }
}

/// A product priced in a display currency, with images and variants.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub currency: CurrencyCode,
    pub brand: Option<String>,
    pub ingredients: Option<String>,
    pub usage_instructions: Option<String>,
    pub benefits: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<ProductImage>,
    pub variants: Vec<VariantView>,
}

impl ProductView {
    /// Convert a product row into a priced view.
    #[must_use]
    pub fn from_product(
        product: Product,
        images: Vec<ProductImage>,
        variants: Vec<VariantStock>,
        rate: Decimal,
        currency: CurrencyCode,
    ) -> Self {
        let variants = variants
            .into_iter()
            .map(|v| {
                VariantView::from_stock(v, product.base_price, rate, currency.clone())
            })
            .collect();

        Self {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            short_description: product.short_description,
            sku: product.sku,
            price: round2(product.base_price * rate),
            compare_at_price: product.compare_at_price.map(|p| round2(p * rate)),
            currency,
            brand: product.brand,
            ingredients: product.ingredients,
            usage_instructions: product.usage_instructions,
            benefits: product.benefits,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
            images,
            variants,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn category(id: i32, parent: Option<i32>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: format!("cat-{id}"),
            slug: format!("cat-{id}"),
            description: None,
            parent_id: parent.map(CategoryId::new),
            is_active: true,
        }
    }

    #[test]
    fn test_build_tree_nests_children() {
        let flat = vec![
            category(1, None),
            category(2, Some(1)),
            category(3, Some(1)),
            category(4, Some(2)),
            category(5, None),
        ];

        let tree = CategoryNode::build_tree(flat);
        assert_eq!(tree.len(), 2);

        let first = &tree[0];
        assert_eq!(first.category.id, CategoryId::new(1));
        assert_eq!(first.subcategories.len(), 2);
        assert_eq!(first.subcategories[0].subcategories.len(), 1);
        assert!(tree[1].subcategories.is_empty());
    }

    #[test]
    fn test_build_tree_drops_orphans() {
        let flat = vec![category(2, Some(1))];
        assert!(CategoryNode::build_tree(flat).is_empty());
    }

    #[test]
    fn test_variant_pricing_applies_adjustment_and_rate() {
        let stock = VariantStock {
            id: VariantId::new(1),
            product_id: ProductId::new(1),
            name: "50ml".to_owned(),
            sku: "AVOI-SER-001-50".to_owned(),
            price_adjustment: Decimal::from_str("5.00").unwrap(),
            quantity_available: 12,
        };

        let view = VariantView::from_stock(
            stock,
            Decimal::from_str("25.00").unwrap(),
            Decimal::from_str("750.0").unwrap(),
            CurrencyCode::parse("NGN").unwrap(),
        );

        // (25.00 + 5.00) * 750 = 22500.00
        assert_eq!(view.price, Decimal::from_str("22500.00").unwrap());
        assert_eq!(view.quantity_available, 12);
    }
}
