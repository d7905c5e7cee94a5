use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    api::identity::GoTrueClient,
    app::{config::AppConfig, db},
    cart::sessions::CartSessions,
    store::pg::PgStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub identity: Arc<GoTrueClient>,
    pub carts: Arc<CartSessions>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: Arc<AppConfig>) -> Result<Self> {
        let db_pool = db::create_pool(&config.database).await?;
        let identity = GoTrueClient::new(reqwest::Client::new(), &config.identity);
        let carts = CartSessions::new(config.cart.dir.clone())
            .await
            .context("Failed to prepare the cart directory")?;

        Ok(Self {
            store: PgStore::new(db_pool),
            identity: Arc::new(identity),
            carts: Arc::new(carts),
            config,
        })
    }
}
