pub mod orders;
pub mod products;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        catalog::{PageLimits, ProductCatalogService},
        discounts::DiscountService,
        orders::OrderService,
        pricing::{DeliveryFeePolicy, FlatDeliveryFee},
    },
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<ProductCatalogService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    /// Wires the services from configuration, with a flat delivery fee.
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        let fee_policy: Arc<dyn DeliveryFeePolicy> =
            Arc::new(FlatDeliveryFee(config.delivery_fee));
        Self::with_fee_policy(db_pool, config, fee_policy)
    }

    pub fn with_fee_policy(
        db_pool: Arc<DbPool>,
        config: &AppConfig,
        fee_policy: Arc<dyn DeliveryFeePolicy>,
    ) -> Self {
        let catalog = ProductCatalogService::new(
            db_pool.clone(),
            PageLimits {
                default_size: config.api_default_page_size,
                max_size: config.api_max_page_size,
            },
        );
        let discounts = DiscountService::new(db_pool.clone(), config.discount_timezone());
        let orders = OrderService::new(db_pool, catalog.clone(), discounts, fee_policy);

        Self {
            catalog: Arc::new(catalog),
            orders: Arc::new(orders),
        }
    }
}
