//! End-to-end tests through the full router: guard, handlers, storage.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use store_rating_backend::{
    auth::{models::NewAccount, JwtHandler, PasswordHasher, Role},
    build_router,
    db::Database,
    AppState,
};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@x.com";
const ADMIN_PASSWORD: &str = "Admin!234";

struct TestApp {
    db: Database,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state = AppState::new(
            db.clone(),
            JwtHandler::new("integration-test-secret"),
            PasswordHasher::new(4),
        );

        let admin_hash = state.passwords.hash(ADMIN_PASSWORD).unwrap();
        state
            .users
            .insert(NewAccount {
                name: "Ada Admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                address: None,
                password_hash: admin_hash,
                role: Role::Admin,
            })
            .unwrap();

        Self {
            db,
            router: build_router(state),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(&self, name: &str, email: &str, password: &str, role: &str) -> StatusCode {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": password, "role": role })),
            )
            .await;
        status
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    fn count(&self, table: &str) -> i64 {
        self.db
            .lock()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    fn id_of(&self, email: &str) -> i64 {
        self.db
            .lock()
            .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| {
                row.get(0)
            })
            .unwrap()
    }

    /// Owner account plus one store, created through the admin API
    async fn seed_store(&self, admin: &str, store_name: &str, owner_email: &str) -> i64 {
        self.register("Olive Owner", owner_email, "Owner!234", "owner")
            .await;
        let owner_id = self.id_of(owner_email);
        let (status, body) = self
            .send(
                Method::POST,
                "/api/stores/create",
                Some(admin),
                Some(json!({
                    "name": store_name,
                    "email": format!("{}@stores.com", store_name.to_lowercase()),
                    "address": "1 Main St",
                    "ownerId": owner_id.to_string(),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "store create failed: {body}");
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_register_login_list_stores() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    app.seed_store(&admin, "Alpha", "olive@x.com").await;

    assert_eq!(
        app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await,
        StatusCode::OK
    );

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@x.com", "password": "Secr3t!23" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    assert_eq!(body["email"], "ann@x.com");
    let token = body["token"].as_str().unwrap();

    let (status, stores) = app.send(Method::GET, "/api/stores", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    let stores = stores.as_array().unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["name"], "Alpha");
    assert_eq!(stores[0]["average_rating"].as_f64(), Some(0.0));

    let (status, me) = app.send(Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ann@x.com");
    assert_eq!(me["role"], "user");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let app = TestApp::new().await;
    assert_eq!(
        app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await,
        StatusCode::OK
    );

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ann Again", "email": "ann@x.com", "password": "Other!234" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already registered");
    assert_eq!(app.count("users"), 2); // admin + Ann
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ann Lee", "email": "not-an-email", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "ann@x.com", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.count("users"), 1);
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = TestApp::new().await;
    app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@x.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@x.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_guard_rejects_missing_and_bad_tokens() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/stores", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No access, please sign in");

    let (status, _) = app
        .send(Method::GET, "/api/stores", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_user_cannot_reach_admin_routes() {
    let app = TestApp::new().await;
    app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await;
    let token = app.login("ann@x.com", "Secr3t!23").await;

    let (status, _) = app
        .send(Method::GET, "/api/admin/dashboard", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/admin/add-user",
            Some(&token),
            Some(json!({
                "name": "Mallory",
                "email": "mallory@x.com",
                "password": "Evil!234",
                "role": "admin",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.count("users"), 2);

    // Owner routes are closed to plain users as well
    let (status, _) = app
        .send(Method::GET, "/api/owner/my-store", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_store_creation_requires_owner_role() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await;
    let ann_id = app.id_of("ann@x.com");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/admin/add-store",
            Some(&admin),
            Some(json!({
                "name": "Bad Store",
                "email": "bad@stores.com",
                "address": "",
                "ownerId": ann_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Owner not found or not an OWNER role");
    assert_eq!(app.count("stores"), 0);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/admin/add-store",
            Some(&admin),
            Some(json!({ "name": "No Owner", "email": "no@stores.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count("stores"), 0);
}

#[tokio::test]
async fn test_rating_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let store_id = app.seed_store(&admin, "Alpha", "olive@x.com").await;

    app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await;
    app.register("Bob Ray", "bob@x.com", "Secr3t!23", "user").await;
    let ann = app.login("ann@x.com", "Secr3t!23").await;
    let bob = app.login("bob@x.com", "Secr3t!23").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/ratings",
            Some(&ann),
            Some(json!({ "store_id": store_id, "rating": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let ann_rating = body["rating_id"].as_i64().unwrap();

    // Second submit for the same store is refused, not duplicated
    let (status, body) = app
        .send(
            Method::POST,
            "/api/ratings",
            Some(&ann),
            Some(json!({ "storeId": store_id.to_string(), "rating": "5" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "You already rated this store; update your rating instead"
    );
    assert_eq!(app.count("ratings"), 1);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/ratings",
            Some(&bob),
            Some(json!({ "store_id": store_id, "rating": 6 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/ratings",
            Some(&bob),
            Some(json!({ "store_id": 999, "rating": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/ratings",
            Some(&bob),
            Some(json!({ "store_id": store_id, "rating": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Bob may not touch Ann's rating
    let uri = format!("/api/ratings/{ann_rating}");
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&bob), Some(json!({ "rating": 1 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&ann), Some(json!({ "rating": 5 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Rating updated");

    // ratings are now 5 (Ann) and 4 (Bob)
    let (status, stores) = app
        .send(Method::GET, "/api/stores/user-list", Some(&ann), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores[0]["average_rating"].as_f64(), Some(4.5));
    assert_eq!(stores[0]["user_rating"], 5);

    let owner = app.login("olive@x.com", "Owner!234").await;
    let (status, ratings) = app
        .send(Method::GET, "/api/owner/my-store", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let ratings = ratings.as_array().unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[0]["user_name"], "Ann Lee");
    assert_eq!(ratings[0]["rating"], 5);

    let (status, body) = app
        .send(Method::GET, "/api/owner/my-store/average", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_rating"], "4.5");

    // Owners cannot rate
    let (status, _) = app
        .send(
            Method::POST,
            "/api/ratings",
            Some(&owner),
            Some(json!({ "store_id": store_id, "rating": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_views() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let store_id = app.seed_store(&admin, "Alpha", "olive@x.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/admin/add-user",
            Some(&admin),
            Some(json!({
                "name": "Ann Lee",
                "email": "ann@x.com",
                "password": "Secr3t!23",
                "address": "2 Side St",
                "role": "user",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let ann_id = body["id"].as_i64().unwrap();

    let ann = app.login("ann@x.com", "Secr3t!23").await;
    app.send(
        Method::POST,
        "/api/ratings",
        Some(&ann),
        Some(json!({ "store_id": store_id, "rating": 4 })),
    )
    .await;

    let (status, counts) = app
        .send(Method::GET, "/api/admin/dashboard", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts, json!({ "users": 3, "stores": 1, "ratings": 1 }));

    let (status, users) = app
        .send(Method::GET, "/api/admin/users?role=owner", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["email"], "olive@x.com");
    assert!(users[0].get("password").is_none());

    let (status, _) = app
        .send(Method::GET, "/api/admin/users?role=root", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, owners) = app
        .send(Method::GET, "/api/admin/owners", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owners[0]["name"], "Olive Owner");

    let (status, stores) = app
        .send(Method::GET, "/api/admin/stores", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores[0]["owner_email"], "olive@x.com");
    assert_eq!(stores[0]["average_rating"].as_f64(), Some(4.0));

    let owner_id = app.id_of("olive@x.com");
    let (status, detail) = app
        .send(
            Method::GET,
            &format!("/api/admin/users/{owner_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["user"]["role"], "owner");
    assert_eq!(detail["stores"][0]["average_rating"].as_f64(), Some(4.0));

    let (status, detail) = app
        .send(
            Method::GET,
            &format!("/api/admin/users/{ann_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["stores"], json!([]));

    let (status, _) = app
        .send(Method::GET, "/api/admin/users/9999", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_password() {
    let app = TestApp::new().await;
    app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await;
    let token = app.login("ann@x.com", "Secr3t!23").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/update-password",
            Some(&token),
            Some(json!({ "currentPassword": "wrong", "newPassword": "Better!234" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password incorrect");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/update-password",
            Some(&token),
            Some(json!({ "currentPassword": "Secr3t!23", "newPassword": "weak" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/update-password",
            Some(&token),
            Some(json!({ "currentPassword": "Secr3t!23", "newPassword": "Better!234" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    app.login("ann@x.com", "Better!234").await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@x.com", "password": "Secr3t!23" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_legacy_plaintext_login_is_rehashed() {
    let app = TestApp::new().await;
    app.db
        .lock()
        .execute(
            "INSERT INTO users (name, email, password, role) VALUES ('Old Timer', 'old@x.com', 'plain-pass', 'user')",
            [],
        )
        .unwrap();

    let token = app.login("old@x.com", "plain-pass").await;
    assert!(!token.is_empty());

    let stored = || -> String {
        app.db
            .lock()
            .query_row(
                "SELECT password FROM users WHERE email = 'old@x.com'",
                [],
                |row| row.get(0),
            )
            .unwrap()
    };

    let mut migrated = false;
    for _ in 0..100 {
        if stored().starts_with("$2") {
            migrated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(migrated, "legacy password was not rehashed");

    // Still logs in, now through the bcrypt path
    app.login("old@x.com", "plain-pass").await;
}

#[tokio::test]
async fn test_owner_average_matches_store_average_rounding() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let store_id = app.seed_store(&admin, "Alpha", "olive@x.com").await;

    // 1, 2, 3, 3 averages to 2.25
    for (i, rating) in [1, 2, 3, 3].into_iter().enumerate() {
        let email = format!("rater{i}@x.com");
        app.register("Rater", &email, "Secr3t!23", "user").await;
        let token = app.login(&email, "Secr3t!23").await;
        let (status, _) = app
            .send(
                Method::POST,
                "/api/ratings",
                Some(&token),
                Some(json!({ "store_id": store_id, "rating": rating })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, stores) = app.send(Method::GET, "/api/stores", Some(&admin), None).await;
    assert_eq!(stores[0]["average_rating"].as_f64(), Some(2.3));

    let owner = app.login("olive@x.com", "Owner!234").await;
    let (status, body) = app
        .send(Method::GET, "/api/owner/my-store/average", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_rating"], "2.3");
}

#[tokio::test]
async fn test_non_numeric_path_id_is_json_bad_request() {
    let app = TestApp::new().await;
    let admin = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    app.register("Ann Lee", "ann@x.com", "Secr3t!23", "user").await;
    let ann = app.login("ann@x.com", "Secr3t!23").await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/api/ratings/abc",
            Some(&ann),
            Some(json!({ "rating": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = app
        .send(Method::GET, "/api/admin/users/abc", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}
