pub mod common;
pub mod health;
pub mod orders;
pub mod plans;
pub mod productions;
pub mod products;
pub mod status;

use crate::db::DbPool;
use crate::services::{
    orders::OrderService, plans::PlanService, products::ProductService,
    ProductionLedgerService, StatusAggregatorService,
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub ledger: Arc<ProductionLedgerService>,
    pub status: Arc<StatusAggregatorService>,
    pub plans: Arc<PlanService>,
    pub orders: Arc<OrderService>,
    pub products: Arc<ProductService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            ledger: Arc::new(ProductionLedgerService::new(db_pool.clone())),
            status: Arc::new(StatusAggregatorService::new(db_pool.clone())),
            plans: Arc::new(PlanService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool)),
        }
    }
}
