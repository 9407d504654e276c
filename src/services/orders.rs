use crate::{
    db::DbPool,
    entities::discount::{self, Entity as DiscountEntity},
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_item::{self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity},
    errors::ServiceError,
    metrics::{ORDERS_CREATED, ORDERS_DELETED, ORDER_CREATION_FAILURES},
    services::{
        catalog::{OrderItemRequest, ProductCatalogService},
        discounts::{DiscountService, ValidatedDiscount},
        pricing::{
            self, DeliveryFeePolicy, LineItem, PricingFactory, PricingFlags, PricingInput,
        },
        reorder::{apply_overrides, OrderDraft, OrderDraftOverrides},
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Credit,
    Debit,
    Paypal,
    Transfer,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(PaymentMethod::Credit),
            "debit" => Ok(PaymentMethod::Debit),
            "paypal" => Ok(PaymentMethod::Paypal),
            "transfer" => Ok(PaymentMethod::Transfer),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(ServiceError::InternalError(format!(
                "Unknown payment method '{}'",
                other
            ))),
        }
    }
}

/// Body of `POST /orders`. Prices are never accepted from the client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "contactName is required"))]
    pub contact_name: String,
    #[validate(email(message = "contactEmail must be a valid e-mail address"))]
    pub contact_email: String,
    #[validate(length(min = 1, message = "contactPhone is required"))]
    pub contact_phone: String,
    #[validate(length(min = 1, message = "country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "zipCode is required"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "deliveryAddress is required"))]
    pub delivery_address: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    #[validate(length(min = 1, message = "discountCode cannot be empty"))]
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price.round_dp(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSummary {
    pub id: i32,
    pub code: String,
    #[schema(value_type = String, example = "0.1")]
    pub percentage: Decimal,
}

impl From<discount::Model> for DiscountSummary {
    fn from(model: discount::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            percentage: model.amount.normalize(),
        }
    }
}

impl From<ValidatedDiscount> for DiscountSummary {
    fn from(validated: ValidatedDiscount) -> Self {
        Self {
            id: validated.id,
            code: validated.code,
            percentage: validated.percentage,
        }
    }
}

/// An order with its items and discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: i32,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub country: String,
    pub city: String,
    pub zip_code: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    #[schema(value_type = String, example = "250.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "24000.00")]
    pub fee: Decimal,
    #[schema(value_type = String, example = "24225.00")]
    pub total_price: Decimal,
    pub discount_id: Option<i32>,
    pub discount: Option<DiscountSummary>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderDetail {
    fn assemble(
        order: order::Model,
        items: Vec<order_item::Model>,
        discount: Option<DiscountSummary>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            id: order.id,
            payment_method: order.payment_method.parse()?,
            contact_name: order.contact_name,
            contact_email: order.contact_email,
            contact_phone: order.contact_phone,
            country: order.country,
            city: order.city,
            zip_code: order.zip_code,
            delivery_address: order.delivery_address,
            notes: order.notes,
            subtotal: order.subtotal.round_dp(2),
            fee: order.fee.round_dp(2),
            total_price: order.total_price.round_dp(2),
            discount_id: order.discount_id,
            discount,
            is_active: order.is_active,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
        })
    }
}

/// Row of `GET /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: i32,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub country: String,
    pub city: String,
    pub zip_code: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub fee: Decimal,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    /// Discount percentage, if the order used a code
    #[schema(value_type = Option<String>)]
    pub discount: Option<Decimal>,
    pub items_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteOrderResult {
    pub success: bool,
    pub message: String,
}

/// Order workflow: creation, listing, lookup, soft delete and reorder.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    catalog: ProductCatalogService,
    discounts: DiscountService,
    fee_policy: Arc<dyn DeliveryFeePolicy>,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        catalog: ProductCatalogService,
        discounts: DiscountService,
        fee_policy: Arc<dyn DeliveryFeePolicy>,
    ) -> Self {
        Self {
            db_pool,
            catalog,
            discounts,
            fee_policy,
        }
    }

    /// Validates, prices and persists a new order in one transaction
    #[instrument(skip(self, request), fields(items = request.items.len(), discount_code = ?request.discount_code))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        let result = self.create_order_inner(request).await;
        match &result {
            Ok(order) => {
                ORDERS_CREATED.inc();
                info!(order_id = order.id, total_price = %order.total_price, "Order created");
            }
            Err(e) => {
                ORDER_CREATION_FAILURES.inc();
                match e {
                    ServiceError::ValidationError(_) => {
                        warn!(error = %e, "Order rejected")
                    }
                    _ => error!(error = %e, "Order creation failed"),
                }
            }
        }
        result
    }

    async fn create_order_inner(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        request.validate()?;

        let line_items = self.catalog.validate_items(&request.items).await?;
        let discount = self
            .discounts
            .validate_optional(request.discount_code.as_deref())
            .await?;

        let fee = self.fee_policy.fee_for(&line_items);
        let raw_subtotal = pricing::subtotal(&line_items);
        let discount_amount = discount
            .as_ref()
            .map(|d| pricing::discount_amount(raw_subtotal, d.percentage))
            .unwrap_or(Decimal::ZERO);

        let calculator = PricingFactory::build(PricingFlags {
            has_fee: fee > Decimal::ZERO,
            has_discount: discount.is_some(),
        });
        let priced = calculator.compute(&PricingInput {
            items: line_items.clone(),
            fee: Some(fee),
            discount_amount: Some(discount_amount),
        });

        if priced.subtotal != raw_subtotal {
            return Err(ServiceError::InternalError(format!(
                "pricing chain subtotal {} differs from raw subtotal {}",
                priced.subtotal, raw_subtotal
            )));
        }

        let discount_id = discount.as_ref().map(|d| d.id);
        let (order_model, items) = self
            .db_pool
            .transaction::<_, _, ServiceError>(move |txn| {
                Box::pin(async move {
                    let order_model = OrderActiveModel {
                        contact_name: Set(request.contact_name),
                        contact_email: Set(request.contact_email),
                        contact_phone: Set(request.contact_phone),
                        country: Set(request.country),
                        city: Set(request.city),
                        zip_code: Set(request.zip_code),
                        delivery_address: Set(request.delivery_address),
                        notes: Set(request.notes),
                        payment_method: Set(request.payment_method.as_str().to_string()),
                        subtotal: Set(priced.subtotal),
                        fee: Set(priced.fee),
                        total_price: Set(priced.total),
                        discount_id: Set(discount_id),
                        is_active: Set(true),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let mut items = Vec::with_capacity(line_items.len());
                    for LineItem {
                        product_id,
                        quantity,
                        price,
                    } in line_items
                    {
                        let item = OrderItemActiveModel {
                            order_id: Set(order_model.id),
                            product_id: Set(product_id),
                            quantity: Set(quantity),
                            price: Set(price),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                        items.push(item);
                    }

                    Ok((order_model, items))
                })
            })
            .await?;

        OrderDetail::assemble(order_model, items, discount.map(DiscountSummary::from))
    }

    /// Active orders, oldest first
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>, ServiceError> {
        let db = &*self.db_pool;

        let orders = OrderEntity::find()
            .filter(order::Column::IsActive.eq(true))
            .order_by_asc(order::Column::Id)
            .find_with_related(OrderItemEntity)
            .all(db)
            .await?;

        let discount_ids: Vec<i32> = orders.iter().filter_map(|(o, _)| o.discount_id).collect();
        let percentages: HashMap<i32, Decimal> = if discount_ids.is_empty() {
            HashMap::new()
        } else {
            DiscountEntity::find()
                .filter(discount::Column::Id.is_in(discount_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|d| (d.id, d.amount.normalize()))
                .collect()
        };

        orders
            .into_iter()
            .map(|(order, items)| {
                Ok(OrderSummary {
                    id: order.id,
                    payment_method: order.payment_method.parse()?,
                    discount: order
                        .discount_id
                        .and_then(|id| percentages.get(&id).copied()),
                    items_count: items.len(),
                    contact_name: order.contact_name,
                    contact_email: order.contact_email,
                    contact_phone: order.contact_phone,
                    country: order.country,
                    city: order.city,
                    zip_code: order.zip_code,
                    delivery_address: order.delivery_address,
                    notes: order.notes,
                    subtotal: order.subtotal.round_dp(2),
                    fee: order.fee.round_dp(2),
                    total_price: order.total_price.round_dp(2),
                    created_at: order.created_at,
                })
            })
            .collect()
    }

    /// Any order by id, soft-deleted ones included
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order with ID {} not found", id)))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?;

        let discount = match order.discount_id {
            Some(discount_id) => DiscountEntity::find_by_id(discount_id)
                .one(db)
                .await?
                .map(DiscountSummary::from),
            None => None,
        };

        OrderDetail::assemble(order, items, discount)
    }

    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i32) -> Result<DeleteOrderResult, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order with ID {} not found", id)))?;

        if !order.is_active {
            warn!(order_id = id, "Order already deleted");
            return Err(ServiceError::Conflict(format!(
                "Order {} is already deleted",
                id
            )));
        }

        let mut active: OrderActiveModel = order.into();
        active.is_active = Set(false);
        active.update(db).await?;

        ORDERS_DELETED.inc();
        info!(order_id = id, "Order soft-deleted");

        Ok(DeleteOrderResult {
            success: true,
            message: format!("Order {} has been deleted", id),
        })
    }

    /// Draft copied from an existing order, before any overrides
    pub async fn draft_from_order(&self, id: i32) -> Result<OrderDraft, ServiceError> {
        let order = self.get_order(id).await?;
        Ok(OrderDraft::from(&order))
    }

    /// Draft of `id` with `overrides` applied
    #[instrument(skip(self, overrides))]
    pub async fn reorder_draft(
        &self,
        id: i32,
        overrides: OrderDraftOverrides,
    ) -> Result<OrderDraft, ServiceError> {
        let base = self.draft_from_order(id).await?;
        Ok(apply_overrides(&base, overrides))
    }

    /// Places a new order from a draft of `id`. Prices and discount are
    /// validated again as for any new order.
    #[instrument(skip(self, overrides))]
    pub async fn reorder_now(
        &self,
        id: i32,
        overrides: OrderDraftOverrides,
    ) -> Result<OrderDetail, ServiceError> {
        let draft = self.reorder_draft(id, overrides).await?;
        self.create_order(draft.to_create_request()).await
    }

    /// Exposes product validation for client-side pre-checks
    pub async fn validate_products(
        &self,
        items: &[OrderItemRequest],
    ) -> Result<Vec<LineItem>, ServiceError> {
        self.catalog.validate_items(items).await
    }

    /// Exposes discount validation for client-side pre-checks
    pub async fn validate_discount(&self, code: &str) -> Result<ValidatedDiscount, ServiceError> {
        self.discounts.validate_code(code).await
    }
}
