mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

use common::{json_body, money, TestApp};
use storefront_orders::entities::{discount, order, order_item, product};

struct Catalogue {
    keyboard: i32,
    mouse: i32,
}

async fn seed_catalogue(app: &TestApp) -> Catalogue {
    let keyboard = app.seed_product("Keyboard", dec!(100), true).await;
    let mouse = app.seed_product("Mouse", dec!(50), true).await;
    Catalogue {
        keyboard: keyboard.id,
        mouse: mouse.id,
    }
}

fn order_payload(catalogue: &Catalogue, discount_code: Option<&str>) -> Value {
    let mut payload = json!({
        "contactName": "Ana Gomez",
        "contactEmail": "ana@example.com",
        "contactPhone": "+57 300 000 0000",
        "country": "Colombia",
        "city": "Medellin",
        "zipCode": "050001",
        "deliveryAddress": "Calle 10 #43-12",
        "notes": "Leave at the front desk",
        "paymentMethod": "credit",
        "items": [
            { "productId": catalogue.keyboard, "quantity": 2 },
            { "productId": catalogue.mouse, "quantity": 1 }
        ]
    });
    if let Some(code) = discount_code {
        payload["discountCode"] = json!(code);
    }
    payload
}

async fn create_order(app: &TestApp, payload: Value) -> Value {
    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload))
        .await;
    json_body(response, StatusCode::CREATED).await["data"].clone()
}

async fn row_counts(app: &TestApp) -> (u64, u64) {
    let db = &*app.state.db;
    let orders = order::Entity::find().count(db).await.unwrap();
    let items = order_item::Entity::find().count(db).await.unwrap();
    (orders, items)
}

fn local_today(app: &TestApp) -> chrono::NaiveDate {
    Utc::now()
        .with_timezone(&app.state.config.discount_timezone())
        .date_naive()
}

#[tokio::test]
async fn order_without_fee_or_discount_totals_the_subtotal() {
    let app = TestApp::with_delivery_fee(Decimal::ZERO).await;
    let catalogue = seed_catalogue(&app).await;

    let order = create_order(&app, order_payload(&catalogue, None)).await;

    assert_eq!(money(&order["subtotal"]), dec!(250));
    assert_eq!(money(&order["fee"]), dec!(0));
    assert_eq!(money(&order["totalPrice"]), dec!(250));
    assert!(order["discount"].is_null());
    assert_eq!(order["isActive"], true);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(money(&order["items"][0]["price"]), dec!(100));
    assert_eq!(order["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn delivery_fee_is_added_to_the_total() {
    let app = TestApp::with_delivery_fee(dec!(24000)).await;
    let catalogue = seed_catalogue(&app).await;

    let order = create_order(&app, order_payload(&catalogue, None)).await;

    assert_eq!(money(&order["subtotal"]), dec!(250));
    assert_eq!(money(&order["fee"]), dec!(24000));
    assert_eq!(money(&order["totalPrice"]), dec!(24250));
}

#[tokio::test]
async fn discount_applies_to_subtotal_before_fee() {
    let app = TestApp::with_delivery_fee(dec!(24000)).await;
    let catalogue = seed_catalogue(&app).await;
    let discount = app
        .seed_discount(
            "WELCOME10",
            dec!(0.10),
            true,
            Some(local_today(&app) + Duration::days(30)),
        )
        .await;

    let order = create_order(&app, order_payload(&catalogue, Some("WELCOME10"))).await;

    assert_eq!(money(&order["subtotal"]), dec!(250));
    assert_eq!(money(&order["fee"]), dec!(24000));
    assert_eq!(money(&order["totalPrice"]), dec!(24225));
    assert_eq!(order["discountId"], discount.id);
    assert_eq!(order["discount"]["code"], "WELCOME10");
    assert_eq!(money(&order["discount"]["percentage"]), dec!(0.1));
}

#[tokio::test]
async fn order_prices_come_from_the_catalogue() {
    let app = TestApp::with_delivery_fee(Decimal::ZERO).await;
    let catalogue = seed_catalogue(&app).await;
    let mut payload = order_payload(&catalogue, None);
    payload["items"][0]["price"] = json!("1.00");

    let order = create_order(&app, payload).await;
    assert_eq!(money(&order["items"][0]["price"]), dec!(100));
    assert_eq!(money(&order["totalPrice"]), dec!(250));
}

#[tokio::test]
async fn discount_valid_until_today_is_still_accepted() {
    let app = TestApp::with_delivery_fee(Decimal::ZERO).await;
    let catalogue = seed_catalogue(&app).await;
    app.seed_discount("LASTDAY", dec!(0.20), true, Some(local_today(&app)))
        .await;

    let order = create_order(&app, order_payload(&catalogue, Some("LASTDAY"))).await;
    assert_eq!(money(&order["totalPrice"]), dec!(200));
}

#[tokio::test]
async fn expired_discount_is_rejected_without_writing() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    app.seed_discount(
        "EXPIRED5",
        dec!(0.05),
        true,
        Some(local_today(&app) - Duration::days(1)),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload(&catalogue, Some("EXPIRED5"))),
        )
        .await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;

    assert!(body["message"].as_str().unwrap().contains("expired"));
    assert_eq!(row_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn inactive_and_unknown_discounts_are_rejected() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    app.seed_discount("SPRING25", dec!(0.25), false, None).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload(&catalogue, Some("SPRING25"))),
        )
        .await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;
    assert!(body["message"].as_str().unwrap().contains("not active"));

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload(&catalogue, Some("NOPE"))),
        )
        .await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;
    assert!(body["message"].as_str().unwrap().contains("not found"));

    assert_eq!(row_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn unknown_or_inactive_products_are_listed_and_nothing_is_written() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    let retired = app.seed_product("Webcam", dec!(19.99), false).await;

    let mut payload = order_payload(&catalogue, None);
    payload["items"] = json!([
        { "productId": catalogue.keyboard, "quantity": 1 },
        { "productId": 999, "quantity": 1 },
        { "productId": retired.id, "quantity": 3 }
    ]);

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;
    let message = body["message"].as_str().unwrap();

    assert!(message.ends_with(&format!(": 999, {}", retired.id)), "{message}");
    assert_eq!(row_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn empty_items_and_bad_contact_data_are_rejected() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;

    let mut payload = order_payload(&catalogue, None);
    payload["items"] = json!([]);
    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("at least one item"));

    let mut payload = order_payload(&catalogue, None);
    payload["contactEmail"] = json!("not-an-email");
    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut payload = order_payload(&catalogue, None);
    payload["items"][0]["quantity"] = json!(0);
    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(row_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn list_returns_active_orders_oldest_first() {
    let app = TestApp::with_delivery_fee(Decimal::ZERO).await;
    let catalogue = seed_catalogue(&app).await;
    app.seed_discount("WELCOME10", dec!(0.10), true, None).await;

    let first = create_order(&app, order_payload(&catalogue, None)).await;
    let second = create_order(&app, order_payload(&catalogue, Some("WELCOME10"))).await;
    let third = create_order(&app, order_payload(&catalogue, None)).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/orders/{}", second["id"]),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/v1/orders", None).await;
    let body = json_body(response, StatusCode::OK).await;
    let orders = body["data"].as_array().unwrap();

    let ids: Vec<&Value> = orders.iter().map(|o| &o["id"]).collect();
    assert_eq!(ids, vec![&first["id"], &third["id"]]);
    assert_eq!(orders[0]["itemsCount"], 2);
    assert!(orders[0]["discount"].is_null());
}

#[tokio::test]
async fn list_reports_discount_percentage() {
    let app = TestApp::with_delivery_fee(Decimal::ZERO).await;
    let catalogue = seed_catalogue(&app).await;
    app.seed_discount("WELCOME10", dec!(0.10), true, None).await;

    create_order(&app, order_payload(&catalogue, Some("WELCOME10"))).await;

    let response = app.request(Method::GET, "/api/v1/orders", None).await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(money(&body["data"][0]["discount"]), dec!(0.1));
    assert_eq!(money(&body["data"][0]["totalPrice"]), dec!(225));
}

#[tokio::test]
async fn soft_deleted_orders_remain_readable_by_id() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    let order = create_order(&app, order_payload(&catalogue, None)).await;
    let uri = format!("/api/v1/orders/{}", order["id"]);

    let response = app.request(Method::DELETE, &uri, None).await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        format!("Order {} has been deleted", order["id"])
    );

    let response = app.request(Method::GET, &uri, None).await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(row_counts(&app).await, (1, 2));
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .expect("timestamp string")
        .parse()
        .expect("rfc3339 timestamp")
}

#[tokio::test]
async fn soft_delete_advances_updated_at() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    let order = create_order(&app, order_payload(&catalogue, None)).await;
    let uri = format!("/api/v1/orders/{}", order["id"]);
    let created_updated_at = timestamp(&order["updatedAt"]);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let response = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, &uri, None).await;
    let deleted = json_body(response, StatusCode::OK).await["data"].clone();
    assert!(timestamp(&deleted["updatedAt"]) > created_updated_at);
    assert_eq!(
        timestamp(&deleted["createdAt"]),
        timestamp(&order["createdAt"])
    );
}

#[tokio::test]
async fn deleting_twice_conflicts_and_unknown_ids_are_not_found() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    let order = create_order(&app, order_payload(&catalogue, None)).await;
    let uri = format!("/api/v1/orders/{}", order["id"]);

    let response = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::DELETE, &uri, None).await;
    let body = json_body(response, StatusCode::CONFLICT).await;
    assert!(body["message"].as_str().unwrap().contains("already deleted"));

    let response = app.request(Method::DELETE, "/api/v1/orders/4242", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request(Method::GET, "/api/v1/orders/4242", None).await;
    let body = json_body(response, StatusCode::NOT_FOUND).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Order with ID 4242 not found"));
}

#[tokio::test]
async fn reorder_draft_copies_the_order_without_notes() {
    let app = TestApp::with_delivery_fee(dec!(24000)).await;
    let catalogue = seed_catalogue(&app).await;
    app.seed_discount("WELCOME10", dec!(0.10), true, None).await;
    let order = create_order(&app, order_payload(&catalogue, Some("WELCOME10"))).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}/reorder", order["id"]),
            None,
        )
        .await;
    let draft = json_body(response, StatusCode::OK).await["data"].clone();

    assert_eq!(draft["contactName"], "Ana Gomez");
    assert_eq!(draft["paymentMethod"], "credit");
    assert!(draft["notes"].is_null());
    assert_eq!(draft["discountCode"], "WELCOME10");
    assert_eq!(money(&draft["totalPrice"]), dec!(24225));
    assert_eq!(draft["items"].as_array().unwrap().len(), 2);
    assert_eq!(draft["items"][1]["productId"], catalogue.mouse);

    // Nothing is persisted by building a draft
    assert_eq!(row_counts(&app).await, (1, 2));
}

#[tokio::test]
async fn reorder_with_changes_replaces_fields_and_items() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    let order = create_order(&app, order_payload(&catalogue, None)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/reorder-with-changes", order["id"]),
            Some(json!({
                "city": "Bogota",
                "paymentMethod": "cash",
                "items": [{ "productId": catalogue.mouse, "quantity": 4, "price": "50.00" }]
            })),
        )
        .await;
    let draft = json_body(response, StatusCode::OK).await["data"].clone();

    assert_eq!(draft["city"], "Bogota");
    assert_eq!(draft["country"], "Colombia");
    assert_eq!(draft["paymentMethod"], "cash");
    // Notes are only cleared by the plain reorder endpoints
    assert_eq!(draft["notes"], "Leave at the front desk");
    let items = draft["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 4);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/reorder-with-changes", order["id"]),
            Some(json!({ "couponCode": "X" })),
        )
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn reorder_item_overrides_may_omit_prices() {
    let app = TestApp::with_delivery_fee(Decimal::ZERO).await;
    let catalogue = seed_catalogue(&app).await;
    let order = create_order(&app, order_payload(&catalogue, None)).await;
    let overrides = json!({ "items": [{ "productId": catalogue.mouse, "quantity": 4 }] });

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/reorder-with-changes", order["id"]),
            Some(overrides.clone()),
        )
        .await;
    let draft = json_body(response, StatusCode::OK).await["data"].clone();
    assert_eq!(draft["items"].as_array().unwrap().len(), 1);
    assert_eq!(draft["items"][0]["productId"], catalogue.mouse);
    assert_eq!(draft["items"][0]["quantity"], 4);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/reorder-now", order["id"]),
            Some(overrides),
        )
        .await;
    let reordered = json_body(response, StatusCode::CREATED).await["data"].clone();
    assert_eq!(money(&reordered["items"][0]["price"]), dec!(50));
    assert_eq!(money(&reordered["totalPrice"]), dec!(200));
}

#[tokio::test]
async fn reorder_now_places_a_new_priced_order() {
    let app = TestApp::with_delivery_fee(dec!(24000)).await;
    let catalogue = seed_catalogue(&app).await;
    let order = create_order(&app, order_payload(&catalogue, None)).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/reorder-now", order["id"]),
            None,
        )
        .await;
    let reordered = json_body(response, StatusCode::CREATED).await["data"].clone();

    assert_ne!(reordered["id"], order["id"]);
    assert!(reordered["notes"].is_null());
    assert_eq!(money(&reordered["totalPrice"]), dec!(24250));
    assert_eq!(row_counts(&app).await, (2, 4));
}

#[tokio::test]
async fn reorder_now_accepts_overrides_and_revalidates() {
    let app = TestApp::with_delivery_fee(Decimal::ZERO).await;
    let catalogue = seed_catalogue(&app).await;
    let order = create_order(&app, order_payload(&catalogue, None)).await;
    let uri = format!("/api/v1/orders/{}/reorder-now", order["id"]);

    let response = app
        .request(
            Method::POST,
            &uri,
            Some(json!({
                "notes": "Ring twice",
                "items": [{ "productId": catalogue.keyboard, "quantity": 3, "price": "1.00" }]
            })),
        )
        .await;
    let reordered = json_body(response, StatusCode::CREATED).await["data"].clone();
    assert_eq!(reordered["notes"], "Ring twice");
    // Draft prices are ignored in favour of the catalogue
    assert_eq!(money(&reordered["totalPrice"]), dec!(300));

    let response = app
        .request(
            Method::POST,
            &uri,
            Some(json!({ "discountCode": "GHOST" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(row_counts(&app).await, (2, 3));

    let response = app
        .request(Method::POST, "/api/v1/orders/9999/reorder-now", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validate_products_endpoint_returns_current_prices() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/validate-products",
            Some(json!([
                { "productId": catalogue.mouse, "quantity": 3 },
                { "productId": catalogue.keyboard, "quantity": 1 }
            ])),
        )
        .await;
    let body = json_body(response, StatusCode::OK).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["productId"], catalogue.mouse);
    assert_eq!(money(&items[0]["price"]), dec!(50));

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/validate-products",
            Some(json!([])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validate_discount_endpoint_reports_usable_codes() {
    let app = TestApp::new().await;
    app.seed_discount("WELCOME10", dec!(0.10), true, None).await;
    app.seed_discount(
        "EXPIRED5",
        dec!(0.05),
        true,
        Some(local_today(&app) - Duration::days(1)),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/orders/validate-discount/WELCOME10", None)
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["code"], "WELCOME10");
    assert_eq!(money(&body["data"]["percentage"]), dec!(0.1));

    let response = app
        .request(Method::GET, "/api/v1/orders/validate-discount/EXPIRED5", None)
        .await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;
    assert!(body["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn validators_are_idempotent_and_read_only() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    app.seed_discount("WELCOME10", dec!(0.10), true, None).await;
    let db = &*app.state.db;
    let products_before = product::Entity::find().all(db).await.unwrap();
    let discounts_before = discount::Entity::find().all(db).await.unwrap();
    let items = json!([
        { "productId": catalogue.keyboard, "quantity": 2 },
        { "productId": catalogue.mouse, "quantity": 1 }
    ]);

    let mut product_results = Vec::new();
    let mut discount_results = Vec::new();
    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/orders/validate-products",
                Some(items.clone()),
            )
            .await;
        product_results.push(json_body(response, StatusCode::OK).await["data"].clone());

        let response = app
            .request(Method::GET, "/api/v1/orders/validate-discount/WELCOME10", None)
            .await;
        discount_results.push(json_body(response, StatusCode::OK).await["data"].clone());
    }

    assert_eq!(product_results[0], product_results[1]);
    assert_eq!(discount_results[0], discount_results[1]);
    assert_eq!(product::Entity::find().all(db).await.unwrap(), products_before);
    assert_eq!(discount::Entity::find().all(db).await.unwrap(), discounts_before);
    assert_eq!(row_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn unknown_request_fields_are_rejected() {
    let app = TestApp::new().await;
    let catalogue = seed_catalogue(&app).await;
    let mut payload = order_payload(&catalogue, None);
    payload["totalPrice"] = json!("1.00");

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(row_counts(&app).await, (0, 0));
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["data"]["database"], "healthy");

    let response = app.request(Method::GET, "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
