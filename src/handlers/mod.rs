use crate::{
    config::AppConfig,
    db::DbPool,
    services::{PhoneQueryService, PhoneRegistry},
};
use std::sync::Arc;

pub mod common;
pub mod phones;

/// Services shared by all handlers
#[derive(Clone)]
pub struct AppServices {
    pub phone_registry: Arc<PhoneRegistry>,
    pub phone_query: Arc<PhoneQueryService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            phone_registry: Arc::new(PhoneRegistry::new(db.clone())),
            phone_query: Arc::new(PhoneQueryService::new(db, config.api_default_page_size)),
        }
    }
}
