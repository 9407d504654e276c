use crate::{
    db::DbPool,
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
    services::pricing::LineItem,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// A product reference as submitted by a client. Any price the client sends
/// is not part of this type and never reaches persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[validate(range(min = 1, message = "productId must be a positive integer"))]
    pub product_id: i32,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price.round_dp(2),
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Query string of `GET /products`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Substring matched against name and description
    pub search: Option<String>,
    pub active: Option<bool>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// One of `id`, `name`, `price`, `createdAt`
    pub order_by: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductPage {
    pub items: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 100,
        }
    }
}

fn sort_column(order_by: Option<&str>) -> product::Column {
    match order_by {
        Some("id") => product::Column::Id,
        Some("name") => product::Column::Name,
        Some("price") => product::Column::Price,
        _ => product::Column::CreatedAt,
    }
}

fn sort_order(order: Option<&str>) -> Order {
    match order.map(str::to_ascii_lowercase).as_deref() {
        Some("asc") => Order::Asc,
        _ => Order::Desc,
    }
}

/// Comma separated list of ids, in the order they were requested.
fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read access to the product catalogue.
#[derive(Clone)]
pub struct ProductCatalogService {
    db_pool: Arc<DbPool>,
    limits: PageLimits,
}

impl ProductCatalogService {
    pub fn new(db_pool: Arc<DbPool>, limits: PageLimits) -> Self {
        Self { db_pool, limits }
    }

    /// Resolves every requested item to an active product and its current
    /// price. Fails as a whole if any id is unknown or inactive.
    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn validate_items(
        &self,
        items: &[OrderItemRequest],
    ) -> Result<Vec<LineItem>, ServiceError> {
        if items.is_empty() {
            warn!("Rejected order without items");
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }
        for item in items {
            item.validate()?;
        }

        let mut requested: Vec<i32> = Vec::with_capacity(items.len());
        for item in items {
            if !requested.contains(&item.product_id) {
                requested.push(item.product_id);
            }
        }

        let prices: HashMap<i32, Decimal> = ProductEntity::find()
            .filter(product::Column::Id.is_in(requested.clone()))
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p.price.round_dp(2)))
            .collect();

        let missing: Vec<i32> = requested
            .into_iter()
            .filter(|id| !prices.contains_key(id))
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Order references unknown or inactive products");
            return Err(ServiceError::ValidationError(format!(
                "Products not found or inactive: {}",
                join_ids(&missing)
            )));
        }

        Ok(items
            .iter()
            .filter_map(|item| {
                prices
                    .get(&item.product_id)
                    .map(|price| LineItem::new(item.product_id, item.quantity, *price))
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductListQuery) -> Result<ProductPage, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.limits.default_size)
            .clamp(1, self.limits.max_size);

        let mut select = ProductEntity::find();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(product::Column::Name.contains(search))
                    .add(product::Column::Description.contains(search)),
            );
        }
        if let Some(active) = query.active {
            select = select.filter(product::Column::IsActive.eq(active));
        }

        let select = select
            .order_by(
                sort_column(query.order_by.as_deref()),
                sort_order(query.order.as_deref()),
            )
            .order_by_asc(product::Column::Id);

        let paginator = select.paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(ProductResponse::from)
            .collect();

        Ok(ProductPage {
            items,
            total,
            page,
            limit,
            pages: total.div_ceil(limit).max(1),
        })
    }
}
