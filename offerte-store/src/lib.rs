pub mod app_config;
pub mod database;
pub mod redis_repo;
pub mod memory;
pub mod offer_repo;
pub mod customer_repo;
pub mod invoice_repo;
pub mod catalog_repo;
pub mod settings_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use redis_repo::RedisClient;
pub use offer_repo::PostgresOfferRepository;
pub use customer_repo::PostgresCustomerRepository;
pub use invoice_repo::PostgresInvoiceRepository;
pub use catalog_repo::PostgresCatalogRepository;
pub use settings_repo::PostgresSettingsRepository;
