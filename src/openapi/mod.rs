use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Orders API",
        version = "1.0.0",
        description = r#"
# Storefront Orders API

Order management for a small storefront.

## Features

- **Orders**: server-priced order creation, listing, lookup and soft delete
- **Reorder**: drafts copied from earlier orders, optionally modified and placed again
- **Validation**: product and discount code pre-checks for clients
- **Catalogue**: paginated product listing

## Pricing

Totals are always computed by the server from the current catalogue:
`totalPrice = max(0, subtotal - subtotal * discount) + fee`.

## Error Handling

Failures share one body shape:

```json
{
  "error": "Bad Request",
  "message": "Validation error: Products not found or inactive: 7",
  "request_id": "5a0b6f43-6a4e-4b47-9a0c-0b6a2b3e9c11",
  "timestamp": "2025-03-09T10:30:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "orders", description = "Order management endpoints"),
        (name = "reorder", description = "Reorder drafts"),
        (name = "products", description = "Product catalogue"),
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::reorder_draft,
        crate::handlers::orders::reorder_with_changes,
        crate::handlers::orders::reorder_now,
        crate::handlers::orders::validate_products,
        crate::handlers::orders::validate_discount,
        crate::handlers::products::list_products,
    ),
    components(
        schemas(
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::PaymentMethod,
            crate::services::orders::OrderDetail,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::OrderSummary,
            crate::services::orders::DiscountSummary,
            crate::services::orders::DeleteOrderResult,
            crate::services::catalog::OrderItemRequest,
            crate::services::catalog::ProductResponse,
            crate::services::catalog::ProductPage,
            crate::services::discounts::ValidatedDiscount,
            crate::services::pricing::LineItem,
            crate::services::reorder::OrderDraft,
            crate::services::reorder::DraftItem,
            crate::services::reorder::OrderDraftOverrides,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
