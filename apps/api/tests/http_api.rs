//! End-to-end tests driving the full router against an in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use comanda_api::{build_router, AppConfig, AppState};
use comanda_core::payload::UpdateUserRequest;
use comanda_db::{Database, DbConfig};

// =============================================================================
// Harness
// =============================================================================

struct TestApp {
    app: Router,
    state: Arc<AppState>,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = Arc::new(AppState::new(AppConfig::default(), db));
        TestApp {
            app: build_router(Arc::clone(&state)),
            state,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    /// Registers a CLIENT and returns `(user id, token)`.
    async fn register(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "email": email, "password": "secret123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["access_token"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(&self) -> String {
        let (id, token) = self.register("admin@example.com").await;
        self.state
            .users()
            .update(
                &id,
                UpdateUserRequest {
                    role: Some("ADMIN".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        token
    }

    async fn create(&self, token: &str, uri: &str, payload: Value) -> Value {
        let (status, body) = self.request(Method::POST, uri, Some(token), Some(payload)).await;
        assert!(status.is_success(), "{uri}: {status} {body}");
        body
    }
}

// =============================================================================
// Health, Routing, Envelope
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/nope", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["path"], "/nope");
    assert_eq!(body["message"], "Cannot GET /nope");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_missing_entity_reports_path() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::GET, "/categories/does-not-exist", None, None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/categories/does-not-exist");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/categories")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["path"], "/categories");
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_register_login_me() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "Ana@Example.com", "password": "secret123", "name": "Ana" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert_eq!(body["user"]["role"], "CLIENT");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = app.request(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ana");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register("dup@example.com").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": "DUP@example.com", "password": "secret123" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bad_credentials_share_one_message() {
    let app = TestApp::new().await;
    app.register("ana@example.com").await;

    let (wrong_password, body_a) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "wrong-pass" })),
        )
        .await;
    let (unknown_email, body_b) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
        )
        .await;

    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a["message"], body_b["message"]);
}

#[tokio::test]
async fn test_admin_gate() {
    let app = TestApp::new().await;
    let (_, client_token) = app.register("client@example.com").await;
    let payload = json!({ "name": "Drinks" });

    let (status, _) = app
        .request(Method::POST, "/categories", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::POST, "/categories", Some("not-a-token"), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::POST, "/categories", Some(&client_token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["statusCode"], 403);

    let (status, _) = app
        .request(Method::GET, "/combos", Some(&client_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request(Method::GET, "/users", Some(&client_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Public reads
    let (status, _) = app.request(Method::GET, "/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request(Method::GET, "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn test_category_rename_conflict_ignores_case() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    app.create(&token, "/categories", json!({ "name": "Drinks" })).await;
    let snacks = app.create(&token, "/categories", json!({ "name": "Snacks" })).await;
    let snacks_id = snacks["category"]["id"].as_str().unwrap();

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/categories/{snacks_id}"),
            Some(&token),
            Some(json!({ "name": "drinks" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Renaming to its own name in another case is fine
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/categories/{snacks_id}"),
            Some(&token),
            Some(json!({ "name": "SNACKS" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "SNACKS");
}

#[tokio::test]
async fn test_category_with_products_cannot_be_deleted() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let category = app.create(&token, "/categories", json!({ "name": "Burgers" })).await;
    let category_id = category["category"]["id"].as_str().unwrap().to_string();
    for name in ["A", "B", "C"] {
        app.create(
            &token,
            "/products",
            json!({ "name": name, "price": 1000, "categoryId": category_id }),
        )
        .await;
    }

    let (status, body) = app
        .request(Method::GET, &format!("/categories/{category_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["productCount"], 3);

    let (status, _) = app
        .request(Method::DELETE, &format!("/categories/{category_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let empty = app.create(&token, "/categories", json!({ "name": "Empty" })).await;
    let empty_id = empty["category"]["id"].as_str().unwrap();
    let (status, body) = app
        .request(Method::DELETE, &format!("/categories/{empty_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_sale_price_must_be_below_price() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/products",
            Some(&token),
            Some(json!({ "name": "Soda", "price": 1000, "salePrice": 1200 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == "salePrice"));
}

#[tokio::test]
async fn test_product_listing_pages_and_filters() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let category = app.create(&token, "/categories", json!({ "name": "Drinks" })).await;
    let category_id = category["category"]["id"].as_str().unwrap().to_string();

    app.create(
        &token,
        "/products",
        json!({ "name": "Cola", "price": 300, "categoryId": category_id, "tags": ["cold"] }),
    )
    .await;
    app.create(
        &token,
        "/products",
        json!({ "name": "Tea", "price": 250, "salePrice": 200, "categoryId": category_id }),
    )
    .await;
    app.create(
        &token,
        "/products",
        json!({ "name": "Fries", "price": 450, "isAvailable": false }),
    )
    .await;

    let (status, body) = app.request(Method::GET, "/products?limit=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);

    let (_, body) = app.request(Method::GET, "/products?onSale=true", None, None).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Tea");
    assert_eq!(data[0]["category"]["name"], "Drinks");

    let (_, body) = app.request(Method::GET, "/products?tags=cold", None, None).await;
    assert_eq!(body["data"][0]["name"], "Cola");

    let (_, body) = app
        .request(Method::GET, &format!("/products/by-category/{category_id}"), None, None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_product_names_fold_non_ascii() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    app.create(
        &token,
        "/products",
        json!({ "name": "Pão de Queijo", "price": 800, "description": "Queijo MINEIRO" }),
    )
    .await;

    let (status, body) = app
        .request(
            Method::POST,
            "/products",
            Some(&token),
            Some(json!({ "name": "PÃO DE QUEIJO", "price": 800 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (_, body) = app
        .request(Method::GET, "/products?search=P%C3%83O", None, None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Pão de Queijo");
}

// =============================================================================
// Combos
// =============================================================================

async fn two_products(app: &TestApp, token: &str) -> (String, String) {
    let burger = app
        .create(token, "/products", json!({ "name": "Burger", "price": 1000 }))
        .await;
    let fries = app
        .create(token, "/products", json!({ "name": "Fries", "price": 500 }))
        .await;
    (
        burger["product"]["id"].as_str().unwrap().to_string(),
        fries["product"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_combo_price_must_undercut_original() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (burger, _) = two_products(&app, &token).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/combos",
            Some(&token),
            Some(json!({
                "name": "Pricey",
                "price": 5000,
                "originalPrice": 4000,
                "items": [{ "productId": burger, "quantity": 1 }],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn test_combo_patch_with_both_prices_checks_order() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (burger, _) = two_products(&app, &token).await;

    let combo = app
        .create(
            &token,
            "/combos",
            json!({
                "name": "Lunch",
                "price": 1200,
                "originalPrice": 1500,
                "items": [{ "productId": burger, "quantity": 1 }],
            }),
        )
        .await;
    let id = combo["combo"]["id"].as_str().unwrap();

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/combos/{id}"),
            Some(&token),
            Some(json!({ "price": 5000, "originalPrice": 4000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["statusCode"], 400);

    let (_, body) = app
        .request(Method::GET, &format!("/combos/{id}"), Some(&token), None)
        .await;
    assert_eq!(body["combo"]["price"], 1200);
    assert_eq!(body["combo"]["originalPrice"], 1500);
}

#[tokio::test]
async fn test_combo_item_quantity_is_capped() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let caviar = app
        .create(&token, "/products", json!({ "name": "Caviar", "price": 2500 }))
        .await;
    let caviar = caviar["product"]["id"].as_str().unwrap();

    let (status, body) = app
        .request(
            Method::POST,
            "/combos",
            Some(&token),
            Some(json!({
                "name": "Endless",
                "price": 1000,
                "items": [{ "productId": caviar, "quantity": 9_000_000_000_000_000_i64 }],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == "items.0.quantity"));

    let (_, body) = app.request(Method::GET, "/combos", Some(&token), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_patch_missing_record_is_not_found_before_body_types() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    for (uri, body) in [
        ("/combos/missing", json!({ "price": "abc" })),
        ("/products/missing", json!({ "price": "abc" })),
        ("/categories/missing", json!({ "name": 5 })),
        ("/users/missing", json!({ "role": ["ADMIN"] })),
    ] {
        let (status, body) = app.request(Method::PATCH, uri, Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}: {body}");
        assert_eq!(body["path"], uri);
    }

    // An existing record still gets its body judged
    let (burger, _) = two_products(&app, &token).await;
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/products/{burger}"),
            Some(&token),
            Some(json!({ "price": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn test_combo_lifecycle() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (burger, fries) = two_products(&app, &token).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/combos",
            Some(&token),
            Some(json!({ "name": "Lunch", "price": 2000, "items": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .request(
            Method::POST,
            "/combos",
            Some(&token),
            Some(json!({
                "name": "Lunch",
                "price": 1200,
                "originalPrice": 1500,
                "items": [
                    { "productId": burger, "quantity": 1 },
                    { "productId": fries, "quantity": 1 },
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["combo"]["itemsTotal"], 1500);
    assert_eq!(body["combo"]["savings"], 300);
    assert_eq!(body["combo"]["isActive"], true);
    assert_eq!(body["combo"]["items"].as_array().unwrap().len(), 2);
    let id = body["combo"]["id"].as_str().unwrap().to_string();

    // Empty items on update leave the item set alone
    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/combos/{id}"),
            Some(&token),
            Some(json!({ "items": [], "isFeatured": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["combo"]["isFeatured"], true);
    assert_eq!(body["combo"]["items"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/combos/{id}"),
            Some(&token),
            Some(json!({ "items": [{ "productId": burger, "quantity": 2 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let items = body["combo"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(body["combo"]["itemsTotal"], 2000);

    // Products used by a combo stay put
    let (status, _) = app
        .request(Method::DELETE, &format!("/products/{burger}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.request(Method::GET, "/combos", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .request(Method::DELETE, &format!("/combos/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(Method::GET, &format!("/combos/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_admin_manages_users() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (client_id, _) = app.register("client@example.com").await;

    let (status, body) = app.request(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/users/{client_id}"),
            Some(&token),
            Some(json!({ "role": "STAFF", "name": "Bea" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["role"], "STAFF");

    let (status, _) = app
        .request(Method::DELETE, &format!("/users/{client_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(Method::GET, &format!("/users/{client_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
