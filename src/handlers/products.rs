use axum::{
    extract::{Query, State},
    response::Json,
};

use crate::{
    errors::ServiceError,
    services::catalog::{ProductListQuery, ProductPage},
    ApiResponse, AppState,
};

/// List catalogue products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    description = "Paginated catalogue with optional search, active filter and sorting",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products retrieved successfully", body = ApiResponse<ProductPage>),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<ProductPage>>, ServiceError> {
    let page = state.services.catalog.list_products(query).await?;
    Ok(Json(ApiResponse::success(page)))
}
