//! Demo-catalog seed command.
//!
//! Inserts the launch catalog through the API crate's repositories: five
//! top-level categories plus one subcategory, a handful of skincare
//! products with size variants, and starting inventory. Safe to re-run;
//! rows that already exist are left alone.

use rust_decimal::Decimal;

use avoi_api::db::{CatalogRepository, InventoryRepository, RepositoryError, create_pool};

use super::{CommandError, database_url};

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
}

struct SeedProduct {
    category_slug: &'static str,
    name: &'static str,
    sku: &'static str,
    /// Base price in cents.
    base_price_cents: i64,
    compare_at_cents: Option<i64>,
    short_description: &'static str,
    description: &'static str,
    /// (variant name, sku suffix, price adjustment cents, starting stock)
    variants: &'static [(&'static str, &'static str, i64, i32)],
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "Cleansers",
        slug: "cleansers",
        description: "Gentle cleansers for all skin types",
    },
    SeedCategory {
        name: "Moisturizers",
        slug: "moisturizers",
        description: "Hydrating moisturizers and creams",
    },
    SeedCategory {
        name: "Serums",
        slug: "serums",
        description: "Targeted treatment serums",
    },
    SeedCategory {
        name: "Toners",
        slug: "toners",
        description: "Balancing toners and essences",
    },
    SeedCategory {
        name: "Masks",
        slug: "masks",
        description: "Face masks and treatments",
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        category_slug: "cleansers",
        name: "Gentle Foaming Cleanser",
        sku: "AVOI-CLN-001",
        base_price_cents: 2500,
        compare_at_cents: Some(3000),
        short_description: "Gentle daily cleanser for all skin types",
        description: "A mild, soap-free cleanser that removes impurities without stripping \
                      the skin of its natural oils.",
        variants: &[("150ml", "150", 0, 50), ("250ml", "250", 800, 30)],
    },
    SeedProduct {
        category_slug: "moisturizers",
        name: "Hydrating Daily Moisturizer",
        sku: "AVOI-MOI-001",
        base_price_cents: 3500,
        compare_at_cents: None,
        short_description: "Daily moisturizer with hyaluronic acid",
        description: "A lightweight, fast-absorbing moisturizer that provides 24-hour hydration.",
        variants: &[("50ml", "50", 0, 40)],
    },
    SeedProduct {
        category_slug: "serums",
        name: "Vitamin C Brightening Serum",
        sku: "AVOI-SER-001",
        base_price_cents: 4500,
        compare_at_cents: Some(5500),
        short_description: "Brightening serum with 15% Vitamin C",
        description: "A potent antioxidant serum that brightens skin and reduces signs of aging.",
        variants: &[("30ml", "30", 0, 25), ("50ml", "50", 1200, 15)],
    },
    SeedProduct {
        category_slug: "toners",
        name: "Balancing Toner",
        sku: "AVOI-TON-001",
        base_price_cents: 2200,
        compare_at_cents: None,
        short_description: "pH-balancing toner with botanical extracts",
        description: "An alcohol-free toner that balances skin pH and prepares skin for \
                      other products.",
        variants: &[("200ml", "200", 0, 60)],
    },
    SeedProduct {
        category_slug: "serums",
        name: "Retinol Renewal Serum",
        sku: "AVOI-SER-002",
        base_price_cents: 5500,
        compare_at_cents: None,
        short_description: "Anti-aging serum with encapsulated retinol",
        description: "A gentle retinol serum that promotes cell turnover and reduces fine lines.",
        variants: &[("30ml", "30", 0, 20)],
    },
    SeedProduct {
        category_slug: "sheet-masks",
        name: "Overnight Repair Sheet Mask",
        sku: "AVOI-MSK-001",
        base_price_cents: 2800,
        compare_at_cents: None,
        short_description: "Single-use overnight treatment mask",
        description: "A rich, restorative mask that draws out impurities while feeding the \
                      skin botanical nutrients.",
        variants: &[("Single", "1", 0, 35), ("5-Pack", "5", 9000, 12)],
    },
];

const DEFAULT_REORDER_LEVEL: i32 = 10;

/// Seed the catalog.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    let catalog = CatalogRepository::new(&pool);
    let inventory = InventoryRepository::new(&pool);

    for category in CATEGORIES {
        match catalog
            .create_category(category.name, category.slug, Some(category.description), None)
            .await
        {
            Ok(_) | Err(RepositoryError::Conflict(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }
    tracing::info!(count = CATEGORIES.len(), "categories seeded");

    // "Sheet Masks" nests under "Masks"; re-parenting goes through the
    // cycle-guarded path.
    let masks = catalog
        .category_by_slug("masks")
        .await?
        .ok_or(CommandError::SeedData("masks category missing"))?;
    match catalog
        .create_category(
            "Sheet Masks",
            "sheet-masks",
            Some("Single-use treatment sheet masks"),
            None,
        )
        .await
    {
        Ok(_) | Err(RepositoryError::Conflict(_)) => {}
        Err(err) => return Err(err.into()),
    }
    let sheet_masks = catalog
        .category_by_slug("sheet-masks")
        .await?
        .ok_or(CommandError::SeedData("sheet-masks category missing"))?;
    catalog
        .set_category_parent(sheet_masks.id, Some(masks.id))
        .await?;

    let mut seeded = 0;
    for product in PRODUCTS {
        if seed_product(&catalog, &inventory, product).await? {
            seeded += 1;
        }
    }
    tracing::info!(seeded, total = PRODUCTS.len(), "products seeded");

    Ok(())
}

/// Seed one product; returns false when it already existed.
async fn seed_product(
    catalog: &CatalogRepository<'_>,
    inventory: &InventoryRepository<'_>,
    product: &SeedProduct,
) -> Result<bool, CommandError> {
    let category = catalog
        .category_by_slug(product.category_slug)
        .await?
        .ok_or(CommandError::SeedData("product references unknown category"))?;

    let base_price = Decimal::new(product.base_price_cents, 2);
    let compare_at = product.compare_at_cents.map(|cents| Decimal::new(cents, 2));

    let created = match catalog
        .create_product(
            category.id,
            product.name,
            product.sku,
            base_price,
            compare_at,
            Some(product.description),
            Some(product.short_description),
            Some("AVOI"),
        )
        .await
    {
        Ok(created) => created,
        Err(RepositoryError::Conflict(_)) => {
            tracing::debug!(sku = product.sku, "product already seeded");
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };

    for &(variant_name, suffix, adjustment_cents, stock) in product.variants {
        let variant_sku = format!("{}-{}", product.sku, suffix);

        let variant_id = match catalog
            .create_variant(
                created.id,
                variant_name,
                &variant_sku,
                Decimal::new(adjustment_cents, 2),
            )
            .await
        {
            Ok(id) => id,
            Err(RepositoryError::Conflict(_)) => continue,
            Err(err) => return Err(err.into()),
        };

        match inventory
            .create_for_variant(variant_id, stock, DEFAULT_REORDER_LEVEL)
            .await
        {
            Ok(_) | Err(RepositoryError::Conflict(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(true)
}
