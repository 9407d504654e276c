use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::{
    errors::ServiceError,
    services::{
        catalog::OrderItemRequest,
        discounts::ValidatedDiscount,
        orders::{CreateOrderRequest, DeleteOrderResult, OrderDetail, OrderSummary},
        pricing::LineItem,
        reorder::{OrderDraft, OrderDraftOverrides},
    },
    ApiResponse, AppState,
};

/// Empty bodies mean "reorder as is, without the old notes".
fn parse_reorder_overrides(body: &[u8]) -> Result<OrderDraftOverrides, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(OrderDraftOverrides::clear_notes());
    }
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid reorder overrides: {}", e)))
}

/// Create a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Validates products and discount code, prices the order server-side and persists it with its items in one transaction",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<OrderDetail>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data, unknown products or rejected discount code", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetail>>), ServiceError> {
    let order = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// List active orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    description = "Active orders in creation order, with item counts and discount percentage",
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<Vec<OrderSummary>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OrderSummary>>>, ServiceError> {
    let orders = state.services.orders.list_orders().await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Get an order by ID
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    description = "Order with its items and discount. Soft-deleted orders are still returned.",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDetail>>, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Soft delete an order
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    summary = "Delete order",
    description = "Marks the order inactive. Nothing is physically removed.",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted", body = DeleteOrderResult),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already deleted", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteOrderResult>, ServiceError> {
    let result = state.services.orders.delete_order(id).await?;
    Ok(Json(result))
}

/// Reorder draft
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/reorder",
    summary = "Reorder draft",
    description = "Unsaved copy of an existing order with notes cleared",
    params(("id" = i32, Path, description = "Source order ID")),
    responses(
        (status = 200, description = "Draft built", body = ApiResponse<OrderDraft>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reorder"
)]
pub async fn reorder_draft(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDraft>>, ServiceError> {
    let draft = state
        .services
        .orders
        .reorder_draft(id, OrderDraftOverrides::clear_notes())
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// Reorder draft with changes
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/reorder-with-changes",
    summary = "Reorder draft with changes",
    description = "Unsaved copy of an existing order with the supplied fields replaced. An items list replaces the original items entirely.",
    params(("id" = i32, Path, description = "Source order ID")),
    request_body = OrderDraftOverrides,
    responses(
        (status = 200, description = "Draft built", body = ApiResponse<OrderDraft>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reorder"
)]
pub async fn reorder_with_changes(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(overrides): Json<OrderDraftOverrides>,
) -> Result<Json<ApiResponse<OrderDraft>>, ServiceError> {
    let draft = state.services.orders.reorder_draft(id, overrides).await?;
    Ok(Json(ApiResponse::success(draft)))
}

/// Reorder now
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/reorder-now",
    summary = "Reorder now",
    description = "Builds a draft (overrides optional, notes cleared by default) and places it as a new order. Products and discount are validated again.",
    params(("id" = i32, Path, description = "Source order ID")),
    request_body(content = OrderDraftOverrides, description = "Optional overrides; an empty body clears notes only"),
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Draft failed validation", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reorder"
)]
pub async fn reorder_now(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetail>>), ServiceError> {
    let overrides = parse_reorder_overrides(&body)?;
    let order = state.services.orders.reorder_now(id, overrides).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Validate products
#[utoipa::path(
    post,
    path = "/api/v1/orders/validate-products",
    summary = "Validate products",
    description = "Resolves items to active products and their current prices",
    request_body = Vec<OrderItemRequest>,
    responses(
        (status = 200, description = "All products valid", body = ApiResponse<Vec<LineItem>>),
        (status = 400, description = "Empty list or unknown/inactive products", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn validate_products(
    State(state): State<AppState>,
    Json(items): Json<Vec<OrderItemRequest>>,
) -> Result<Json<ApiResponse<Vec<LineItem>>>, ServiceError> {
    let items = state.services.orders.validate_products(&items).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Validate discount code
#[utoipa::path(
    get,
    path = "/api/v1/orders/validate-discount/{code}",
    summary = "Validate discount code",
    params(("code" = String, Path, description = "Discount code")),
    responses(
        (status = 200, description = "Code is usable", body = ApiResponse<ValidatedDiscount>),
        (status = 400, description = "Unknown, inactive or expired code", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn validate_discount(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<ValidatedDiscount>>, ServiceError> {
    let discount = state.services.orders.validate_discount(&code).await?;
    Ok(Json(ApiResponse::success(discount)))
}
