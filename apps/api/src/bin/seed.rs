//! # Seed Data Generator
//!
//! Creates an ADMIN account and a small sample menu for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named in comanda.toml / COMANDA_DATABASE_PATH
//! cargo run -p comanda-api --bin seed
//!
//! # Custom admin credentials
//! COMANDA_ADMIN_EMAIL=owner@example.com COMANDA_ADMIN_PASSWORD=changeme \
//!     cargo run -p comanda-api --bin seed
//! ```
//!
//! ## Generated Data
//! - One ADMIN user
//! - Categories: Burgers, Sides, Drinks
//! - A handful of products per category (prices in cents)
//! - One combo built from them
//!
//! Running it twice is harmless: existing users and names are skipped.

use std::env;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use comanda_api::{AppConfig, AppState};
use comanda_core::payload::{
    CreateCategory, CreateCombo, CreateProduct, RegisterRequest, UpdateUserRequest,
};
use comanda_db::{Database, DbConfig};

const DEFAULT_ADMIN_EMAIL: &str = "admin@comanda.local";
const DEFAULT_ADMIN_PASSWORD: &str = "admin1234";

/// `(category, description, [(product, price_cents, tags)])`
const MENU: &[(&str, &str, &[(&str, i64, &[&str])])] = &[
    (
        "Burgers",
        "Grilled to order",
        &[
            ("Classic Burger", 1250, &["beef"]),
            ("Cheese Burger", 1390, &["beef", "cheese"]),
            ("Veggie Burger", 1190, &["vegetarian"]),
        ],
    ),
    (
        "Sides",
        "Something on the side",
        &[
            ("French Fries", 450, &["vegetarian"]),
            ("Onion Rings", 520, &["vegetarian"]),
        ],
    ),
    (
        "Drinks",
        "Cold drinks",
        &[
            ("Cola", 300, &["cold"]),
            ("Lemonade", 350, &["cold", "homemade"]),
        ],
    ),
];

fn payload<T: DeserializeOwned>(value: Value) -> anyhow::Result<T> {
    serde_json::from_value(value).context("Invalid seed payload")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(database = %config.database_path, "Seeding database");

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("Failed to open database")?;
    let state = AppState::new(config, db.clone());

    seed_admin(&state).await?;
    seed_menu(&state).await?;

    db.close().await;
    info!("Seeding complete");
    Ok(())
}

async fn seed_admin(state: &AppState) -> anyhow::Result<()> {
    let email = env::var("COMANDA_ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
    let password =
        env::var("COMANDA_ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());

    if state.db.users().find_by_email(&email).await?.is_some() {
        info!(%email, "Admin user already exists");
        return Ok(());
    }

    let session = state
        .auth()
        .register(payload::<RegisterRequest>(json!({
            "email": email,
            "password": password,
            "name": "Administrator",
        }))?)
        .await?;

    state
        .users()
        .update(
            &session.user.id,
            UpdateUserRequest {
                role: Some("ADMIN".to_string()),
                ..Default::default()
            },
        )
        .await?;

    info!(%email, "Created admin user");
    Ok(())
}

async fn seed_menu(state: &AppState) -> anyhow::Result<()> {
    let mut combo_items = Vec::new();

    for (category_name, description, products) in MENU {
        let category_id = match state.db.categories().find_by_name(category_name).await? {
            Some(existing) => existing.id,
            None => {
                let created = state
                    .categories()
                    .create(payload::<CreateCategory>(json!({
                        "name": category_name,
                        "description": description,
                    }))?)
                    .await?;
                info!(name = %created.name, "Created category");
                created.id
            }
        };

        for (index, (name, price, tags)) in products.iter().enumerate() {
            let product_id = match state.db.products().find_by_name(name).await? {
                Some(existing) => existing.id,
                None => {
                    let created = state
                        .products()
                        .create(payload::<CreateProduct>(json!({
                            "name": name,
                            "price": price,
                            "categoryId": category_id,
                            "tags": tags,
                        }))?)
                        .await?;
                    created.product.id
                }
            };

            // First product of each category goes into the combo
            if index == 0 {
                combo_items.push(product_id);
            }
        }
    }
    info!(products = state.db.products().count().await?, "Menu products ready");

    if state.db.combos().find_by_name("Classic Combo").await?.is_some() {
        return Ok(());
    }

    let items: Vec<Value> = combo_items
        .iter()
        .map(|product_id| json!({ "productId": product_id, "quantity": 1 }))
        .collect();

    let combo = state
        .combos()
        .create(payload::<CreateCombo>(json!({
            "name": "Classic Combo",
            "description": "Burger, side and a drink",
            "price": 1800,
            "originalPrice": 2000,
            "isFeatured": true,
            "tags": ["popular"],
            "items": items,
        }))?)
        .await?;
    info!(name = %combo.combo.name, "Created combo");

    Ok(())
}
