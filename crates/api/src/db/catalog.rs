//! Catalog repository: categories, products, images, variants.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use avoi_core::{CategoryId, ProductId, VariantId};

use super::RepositoryError;
use crate::models::{Category, Product, ProductImage, VariantStock};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, parent_id, is_active";

const PRODUCT_COLUMNS: &str = "id, category_id, name, description, short_description, sku, \
     base_price, compare_at_price, brand, ingredients, usage_instructions, benefits, \
     is_active, created_at, updated_at";

/// Variant columns joined with inventory; stock is always read from the
/// inventory row, the variant itself stores no quantity.
const VARIANT_STOCK_SELECT: &str = "SELECT v.id, v.product_id, v.name, v.sku, v.price_adjustment, \
     COALESCE(i.quantity_available, 0) AS quantity_available \
     FROM product_variants v \
     LEFT JOIN inventory i ON i.variant_id = v.id";

/// Sort orders for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Alphabetical by name.
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
    /// Newest first.
    DateDesc,
}

impl ProductSort {
    /// Parse the `sort_by` query parameter; unknown values sort by name.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("date_desc") => Self::DateDesc,
            _ => Self::Name,
        }
    }

    const fn order_clause(self) -> &'static str {
        match self {
            Self::Name => " ORDER BY name ASC",
            Self::PriceAsc => " ORDER BY base_price ASC",
            Self::PriceDesc => " ORDER BY base_price DESC",
            Self::DateDesc => " ORDER BY created_at DESC",
        }
    }
}

/// Filters for product listings. Price bounds are in the base currency;
/// callers convert display-currency bounds before querying.
#[derive(Debug, Default)]
pub struct ProductFilter<'a> {
    pub category_id: Option<CategoryId>,
    pub search: Option<&'a str>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl ProductFilter<'_> {
    fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(category_id) = self.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(search) = self.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR brand ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(min_price) = self.min_price {
            qb.push(" AND base_price >= ").push_bind(min_price);
        }
        if let Some(max_price) = self.max_price {
            qb.push(" AND base_price <= ").push_bind(max_price);
        }
    }
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All active categories, flat; callers assemble the tree.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active = TRUE ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists or
    /// linking to `parent_id` would create a cycle.
    pub async fn create_category(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, slug, description, parent_id) \
             VALUES ($1, $2, $3, $4) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(parent_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "category slug already exists"))?;

        Ok(category)
    }

    /// Re-parent a category, rejecting links that would form a cycle.
    ///
    /// The ancestor chain of the proposed parent is walked at write time;
    /// if it contains the category itself the update is refused.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a cycle,
    /// `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn set_category_parent(
        &self,
        category_id: CategoryId,
        parent_id: Option<CategoryId>,
    ) -> Result<(), RepositoryError> {
        if let Some(parent_id) = parent_id {
            if parent_id == category_id {
                return Err(RepositoryError::Conflict(
                    "category cannot be its own parent".to_owned(),
                ));
            }

            let (would_cycle,): (bool,) = sqlx::query_as(
                "WITH RECURSIVE ancestors AS ( \
                     SELECT id, parent_id FROM categories WHERE id = $1 \
                     UNION ALL \
                     SELECT c.id, c.parent_id FROM categories c \
                     JOIN ancestors a ON c.id = a.parent_id \
                 ) SELECT EXISTS(SELECT 1 FROM ancestors WHERE id = $2)",
            )
            .bind(parent_id)
            .bind(category_id)
            .fetch_one(self.pool)
            .await?;

            if would_cycle {
                return Err(RepositoryError::Conflict(
                    "category parent link would create a cycle".to_owned(),
                ));
            }
        }

        let result = sqlx::query("UPDATE categories SET parent_id = $1 WHERE id = $2")
            .bind(parent_id)
            .bind(category_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Page through active products with filters; returns the page and the
    /// total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search_products(
        &self,
        filter: &ProductFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = TRUE"
        ));
        filter.apply(&mut qb);
        qb.push(filter.sort.order_clause());
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        let mut count_qb =
            QueryBuilder::new("SELECT COUNT(*) FROM products WHERE is_active = TRUE");
        filter.apply(&mut count_qb);
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(self.pool).await?;

        Ok((products, total))
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_product(
        &self,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Images for a product, primary first then by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, url, alt_text, position, is_primary \
             FROM product_images WHERE product_id = $1 \
             ORDER BY is_primary DESC, position ASC",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Variants for a product, each with its live stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<VariantStock>, RepositoryError> {
        let variants = sqlx::query_as::<_, VariantStock>(&format!(
            "{VARIANT_STOCK_SELECT} WHERE v.product_id = $1 ORDER BY v.id"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(variants)
    }

    /// Get a single variant with its live stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_variant(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<VariantStock>, RepositoryError> {
        let variant = sqlx::query_as::<_, VariantStock>(&format!(
            "{VARIANT_STOCK_SELECT} WHERE v.id = $1"
        ))
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(variant)
    }

    /// Create a product. Used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU already exists.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_product(
        &self,
        category_id: CategoryId,
        name: &str,
        sku: &str,
        base_price: Decimal,
        compare_at_price: Option<Decimal>,
        description: Option<&str>,
        short_description: Option<&str>,
        brand: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (category_id, name, sku, base_price, compare_at_price, \
             description, short_description, brand) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(category_id)
        .bind(name)
        .bind(sku)
        .bind(base_price)
        .bind(compare_at_price)
        .bind(description)
        .bind(short_description)
        .bind(brand)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product sku already exists"))?;

        Ok(product)
    }

    /// Create a variant for a product. Used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU already exists.
    pub async fn create_variant(
        &self,
        product_id: ProductId,
        name: &str,
        sku: &str,
        price_adjustment: Decimal,
    ) -> Result<VariantId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO product_variants (product_id, name, sku, price_adjustment) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(product_id)
        .bind(name)
        .bind(sku)
        .bind(price_adjustment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "variant sku already exists"))?;

        Ok(VariantId::new(id))
    }
}
