#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use phone_inventory_api::{
    auth::Claims,
    config::AppConfig,
    db,
    entities::{
        phone::{self, PhoneStatus},
        region, supplier,
        user::{self, Role},
    },
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-suite-signing-key-0123456789abcdef";

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            8080,
            "development".to_string(),
        );

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("connect to in-memory sqlite");
        db::run_migrations(&pool).await.expect("run migrations");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = phone_inventory_api::app(state.clone());

        Self { router, state }
    }

    /// Mint a bearer token for a caller holding `role`.
    pub fn token_for(&self, role: &str) -> String {
        self.sign(role, &self.state.config.auth_audience)
    }

    /// Mint a token for a different audience; the API must reject it.
    pub fn token_for_audience(&self, role: &str, audience: &str) -> String {
        self.sign(role, audience)
    }

    fn sign(&self, role: &str, audience: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            name: "Integration Caller".to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(1)).timestamp(),
            iss: self.state.config.auth_issuer.clone(),
            aud: audience.to_string(),
        };

        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("encode access token")
    }

    /// Send a request against the router with optional headers and body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Body>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                body
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn post_json(
        &self,
        uri: &str,
        payload: &Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let body = Body::from(serde_json::to_vec(payload).expect("serialize json request body"));
        self.post_raw(uri, body, token).await
    }

    /// Post an arbitrary body, used for malformed JSON.
    pub async fn post_raw(&self, uri: &str, body: Body, token: Option<&str>) -> (StatusCode, Value) {
        let bearer = token.map(|tok| format!("Bearer {}", tok));
        let headers: Vec<(&str, &str)> = bearer
            .as_deref()
            .map(|value| vec![("authorization", value)])
            .unwrap_or_default();

        let response = self.send(Method::POST, uri, Some(body), &headers).await;
        read_json(response).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.send(Method::GET, uri, None, &[]).await;
        read_json(response).await
    }

    pub async fn seed_region(&self, name: &str, location: &str) -> region::Model {
        region::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            location: Set(location.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed region")
    }

    pub async fn seed_user(
        &self,
        first_name: &str,
        last_name: &str,
        role: Role,
        region_id: Option<i32>,
    ) -> user::Model {
        user::ActiveModel {
            id: NotSet,
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            email: Set(format!("{}@inventory.test", Uuid::new_v4())),
            role: Set(role),
            region_id: Set(region_id),
            created_at: Set(Utc::now()),
            deleted_at: Set(None),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed user")
    }

    pub async fn seed_supplier(
        &self,
        name: &str,
        deleted_at: Option<DateTime<Utc>>,
    ) -> supplier::Model {
        supplier::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            contact: Set("+254711000000".to_string()),
            created_at: Set(Utc::now()),
            deleted_at: Set(deleted_at),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed supplier")
    }

    pub async fn seed_phone(
        &self,
        imei: &str,
        status: PhoneStatus,
        supplier_id: Option<i32>,
        manager_id: Option<i32>,
    ) -> phone::Model {
        let now = Utc::now();
        phone::ActiveModel {
            id: NotSet,
            imei: Set(imei.to_string()),
            model: Set("X1".to_string()),
            purchase_price: Set(Decimal::from(18000)),
            sale_price: Set(None),
            supply_date: Set(NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")),
            sale_date: Set(None),
            status: Set(status),
            manager_id: Set(manager_id),
            supplier_id: Set(supplier_id),
            customer_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed phone")
    }
}

pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json response")
    };
    (status, value)
}
