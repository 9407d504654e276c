//! Seed data script - populates the database with a demo catalogue
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://storefront.db?mode=rwc
//!
//! This creates:
//! - 6 products (one of them inactive)
//! - 3 discount codes (active, inactive and expired)

use chrono::{Duration, Utc};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

use storefront_orders::{
    db::{establish_connection, run_migrations},
    entities::{discount, product},
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Insert a demo catalogue and discount codes")]
struct Cli {
    /// Database to seed
    #[arg(
        long,
        env = "APP__DATABASE_URL",
        default_value = "sqlite://storefront.db?mode=rwc"
    )]
    database_url: String,

    /// Insert products even when one with the same name exists
    #[arg(long)]
    allow_duplicate_products: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    info!("Connecting to database: {}", cli.database_url);
    let db = establish_connection(&cli.database_url).await?;
    run_migrations(&db).await?;

    info!("Creating products...");
    let products = create_products(&db, !cli.allow_duplicate_products).await?;
    info!("  Created {} products", products);

    info!("Creating discount codes...");
    let discounts = create_discounts(&db).await?;
    info!("  Created {} discount codes", discounts);

    info!("Seed data complete. Try:");
    info!("  curl http://localhost:8080/api/v1/products");
    info!("  curl http://localhost:8080/api/v1/orders/validate-discount/WELCOME10");

    Ok(())
}

async fn create_products(db: &DatabaseConnection, skip_existing: bool) -> anyhow::Result<usize> {
    let catalogue: [(&str, &str, Decimal, bool); 6] = [
        ("Gaming Laptop", "15\" laptop with dedicated graphics", dec!(1299.99), true),
        ("Wireless Mouse", "Ergonomic 2.4 GHz mouse", dec!(49.99), true),
        ("Mechanical Keyboard", "Hot-swappable switches", dec!(129.99), true),
        ("4K Monitor", "27\" IPS panel", dec!(399.99), true),
        ("Headphones", "Closed-back studio headphones", dec!(79.99), true),
        ("Webcam", "Discontinued 720p webcam", dec!(19.99), false),
    ];

    let mut created = 0;
    for (name, description, price, is_active) in catalogue {
        if skip_existing
            && product::Entity::find()
                .filter(product::Column::Name.eq(name))
                .one(db)
                .await?
                .is_some()
        {
            continue;
        }

        product::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            is_active: Set(is_active),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created += 1;
    }

    Ok(created)
}

async fn create_discounts(db: &DatabaseConnection) -> anyhow::Result<usize> {
    let today = Utc::now().date_naive();
    let codes = [
        ("WELCOME10", dec!(0.10), true, Some(today + Duration::days(365))),
        ("SPRING25", dec!(0.25), false, None),
        ("EXPIRED5", dec!(0.05), true, Some(today - Duration::days(1))),
    ];

    let mut created = 0;
    for (code, amount, is_active, valid_until) in codes {
        // Codes are unique
        if discount::Entity::find()
            .filter(discount::Column::Code.eq(code))
            .one(db)
            .await?
            .is_some()
        {
            continue;
        }

        discount::ActiveModel {
            code: Set(code.to_string()),
            amount: Set(amount),
            is_active: Set(is_active),
            valid_until: Set(valid_until),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created += 1;
    }

    Ok(created)
}
