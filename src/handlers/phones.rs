use super::common::{created_response, success_response, PaginationParams};
use crate::{
    auth::AuthUser,
    entities::phone::{self, PhoneStatus},
    errors::{ErrorResponse, ServiceError},
    services::{PhoneListItem, PhoneRegistry, RegisterPhone},
    ApiResponse, AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

/// Body of a phone registration. Fields are optional here so that the
/// registry can report every missing one at once.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPhoneRequest {
    #[schema(example = "123456789012345")]
    pub imei: Option<String>,
    #[schema(example = "X1")]
    pub model: Option<String>,
    /// Number or decimal string; must be greater than zero
    #[schema(value_type = Option<String>, example = "20000")]
    pub purchase_price: Option<Decimal>,
    #[serde(alias = "supplyDate")]
    #[schema(example = "2025-01-01")]
    pub buy_date: Option<NaiveDate>,
    pub supplier_id: Option<i32>,
    pub manager_id: Option<i32>,
}

impl From<RegisterPhoneRequest> for RegisterPhone {
    fn from(req: RegisterPhoneRequest) -> Self {
        RegisterPhone {
            imei: req.imei,
            model: req.model,
            purchase_price: req.purchase_price,
            supply_date: req.buy_date,
            supplier_id: req.supplier_id,
            manager_id: req.manager_id,
        }
    }
}

/// A stored phone as returned by the registry
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneResponse {
    pub id: i32,
    pub imei: String,
    pub model: String,
    #[schema(value_type = String)]
    pub purchase_price: Decimal,
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Decimal>,
    pub buy_date: NaiveDate,
    pub sale_date: Option<NaiveDate>,
    pub status: PhoneStatus,
    pub manager_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<phone::Model> for PhoneResponse {
    fn from(model: phone::Model) -> Self {
        Self {
            id: model.id,
            imei: model.imei,
            model: model.model,
            purchase_price: model.purchase_price,
            sale_price: model.sale_price,
            buy_date: model.supply_date,
            sale_date: model.sale_date,
            status: model.status,
            manager_id: model.manager_id,
            supplier_id: model.supplier_id,
            customer_id: model.customer_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// One page of phones in a single status
#[derive(Debug, Serialize, ToSchema)]
pub struct PhoneListResponse {
    pub phones: Vec<PhoneListItem>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

/// Creates the router for phone endpoints
pub fn phone_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register_phone))
        .route("/active", get(list_active_phones))
        .route("/suspended", get(list_suspended_phones))
        .route("/sold", get(list_sold_phones))
        .route("/lost", get(list_lost_phones))
}

/// Register a new phone
#[utoipa::path(
    post,
    path = "/api/v1/phones",
    summary = "Register phone",
    description = "Register a new phone as active stock, linked to a supplier and a manager",
    request_body = RegisterPhoneRequest,
    responses(
        (status = 201, description = "Phone registered", body = ApiResponse<PhoneResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or invalid fields, or duplicate IMEI", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller role cannot register phones", body = ErrorResponse),
        (status = 404, description = "Manager or supplier not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Phones"
)]
pub async fn register_phone(
    State(state): State<AppState>,
    caller: AuthUser,
    payload: Result<Json<RegisterPhoneRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    // Role is checked before the body is looked at.
    PhoneRegistry::authorize(&caller)?;

    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection, "unreadable phone registration body");
        ServiceError::ValidationError(rejection.body_text())
    })?;

    let created = state
        .services
        .phone_registry
        .register_phone(&caller, body.into())
        .await?;

    Ok(created_response(
        PhoneResponse::from(created),
        "Phone registered successfully",
    ))
}

/// List active phones
#[utoipa::path(
    get,
    path = "/api/v1/phones/active",
    summary = "List active phones",
    description = "Phones currently in circulation with a manager",
    params(PaginationParams),
    responses(
        (status = 200, description = "Phones retrieved (possibly none)", body = ApiResponse<PhoneListResponse>),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Phones"
)]
pub async fn list_active_phones(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Response, ServiceError> {
    list_phones(&state, PhoneStatus::Active, params).await
}

/// List suspended phones
#[utoipa::path(
    get,
    path = "/api/v1/phones/suspended",
    summary = "List suspended phones",
    description = "Phones temporarily taken out of circulation",
    params(PaginationParams),
    responses(
        (status = 200, description = "Phones retrieved (possibly none)", body = ApiResponse<PhoneListResponse>),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Phones"
)]
pub async fn list_suspended_phones(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Response, ServiceError> {
    list_phones(&state, PhoneStatus::Suspended, params).await
}

/// List sold phones
#[utoipa::path(
    get,
    path = "/api/v1/phones/sold",
    summary = "List sold phones",
    description = "Phones sold to a customer",
    params(PaginationParams),
    responses(
        (status = 200, description = "Phones retrieved (possibly none)", body = ApiResponse<PhoneListResponse>),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Phones"
)]
pub async fn list_sold_phones(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Response, ServiceError> {
    list_phones(&state, PhoneStatus::Sold, params).await
}

/// List lost phones
#[utoipa::path(
    get,
    path = "/api/v1/phones/lost",
    summary = "List lost phones",
    description = "Phones reported lost",
    params(PaginationParams),
    responses(
        (status = 200, description = "Phones retrieved (possibly none)", body = ApiResponse<PhoneListResponse>),
        (status = 400, description = "Invalid pagination parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Phones"
)]
pub async fn list_lost_phones(
    State(state): State<AppState>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Response, ServiceError> {
    list_phones(&state, PhoneStatus::Lost, params).await
}

async fn list_phones(
    state: &AppState,
    status: PhoneStatus,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(params) = params.map_err(|rejection| {
        warn!(error = %rejection, "unreadable pagination query");
        ServiceError::ValidationError("invalid pagination parameters".to_string())
    })?;

    let page = state
        .services
        .phone_query
        .list_by_status(Some(status), params.page(), params.limit())
        .await?;

    let message = if page.is_empty() {
        format!("No {} phones found", status)
    } else {
        format!("{} phones retrieved successfully", status_label(status))
    };

    Ok(success_response(
        PhoneListResponse {
            phones: page.items,
            page: page.page,
            limit: page.limit,
            total: page.total,
        },
        message,
    ))
}

fn status_label(status: PhoneStatus) -> &'static str {
    match status {
        PhoneStatus::Active => "Active",
        PhoneStatus::Suspended => "Suspended",
        PhoneStatus::Sold => "Sold",
        PhoneStatus::Lost => "Lost",
        PhoneStatus::Reconcile => "Reconcile",
    }
}
