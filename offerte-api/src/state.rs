use offerte_core::repository::{
    CatalogRepository, CustomerRepository, InvoiceRepository, OfferRepository, SettingsRepository,
};
use offerte_store::app_config::RateLimitConfig;
use offerte_store::{
    DbClient, InMemoryStore, PostgresCatalogRepository, PostgresCustomerRepository, PostgresInvoiceRepository,
    PostgresOfferRepository, PostgresSettingsRepository, RedisClient,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub offers: Arc<dyn OfferRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    /// Rate limiting is skipped without Redis.
    pub redis: Option<Arc<RedisClient>>,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn in_memory(store: InMemoryStore, auth: AuthConfig) -> Self {
        Self {
            offers: Arc::new(store.clone()),
            customers: Arc::new(store.clone()),
            invoices: Arc::new(store.clone()),
            catalog: Arc::new(store.clone()),
            settings: Arc::new(store),
            redis: None,
            rate_limit: RateLimitConfig::default(),
            auth,
        }
    }

    pub fn postgres(db: &DbClient, auth: AuthConfig) -> Self {
        let pool = db.pool.clone();
        Self {
            offers: Arc::new(PostgresOfferRepository::new(pool.clone())),
            customers: Arc::new(PostgresCustomerRepository::new(pool.clone())),
            invoices: Arc::new(PostgresInvoiceRepository::new(pool.clone())),
            catalog: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            settings: Arc::new(PostgresSettingsRepository::new(pool)),
            redis: None,
            rate_limit: RateLimitConfig::default(),
            auth,
        }
    }

    pub fn with_rate_limit(mut self, redis: RedisClient, limits: RateLimitConfig) -> Self {
        self.redis = Some(Arc::new(redis));
        self.rate_limit = limits;
        self
    }
}
