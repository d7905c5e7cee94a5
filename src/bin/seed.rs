//! Fills an empty catalog with the demo produce.

use std::str::FromStr;

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use harvesthub::{
    app::{bootstrap, config, db},
    models::{Category, CreateProductEntity},
    store::{Store, pg::PgStore},
};

const DEMO_PRODUCTS: [(&str, &str, &str, &str, Category); 3] = [
    (
        "Fresh Apples",
        "2.99",
        "https://images.unsplash.com/photo-1560806887-1e4cd0b6cbd6",
        "Crisp, sweet apples picked this week. Sold per kilogram.",
        Category::Fruit,
    ),
    (
        "Organic Carrots",
        "1.49",
        "https://images.unsplash.com/photo-1598170845058-32b9d6a5da37",
        "Organically grown carrots, washed and ready. Sold per kilogram.",
        Category::Vegetable,
    ),
    (
        "Ripe Bananas",
        "0.99",
        "https://images.unsplash.com/photo-1571771894821-ce9b6c11b08e",
        "Ripe bananas in bulk bunches. Sold per kilogram.",
        Category::Fruit,
    ),
];

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;
    let store = PgStore::new(db::create_pool(&config.database).await?);

    let existing = store.count_products().await?;
    if existing > 0 {
        tracing::info!("Catalog already has {} products, nothing to seed", existing);
        return Ok(());
    }

    for (name, price, image_url, description, category) in DEMO_PRODUCTS {
        let product = store
            .create_product(CreateProductEntity {
                name: name.to_string(),
                price: BigDecimal::from_str(price)
                    .with_context(|| format!("Invalid demo price for {}", name))?,
                image_url: image_url.to_string(),
                description: description.to_string(),
                category,
            })
            .await?;
        tracing::info!("Seeded product {} ({})", product.id, product.name);
    }

    Ok(())
}
