pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::BackofficeConfig;
use crate::handlers::{access, catalog, finance, health, orders, people, scheduling, users};
use crate::middleware::{Caller, CALLER_EMAIL_HEADER};
use crate::services::{ActivityLog, Database, PermissionSource, RequestAudit};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::scheduling::create_appointment,
        handlers::scheduling::update_appointment,
        handlers::scheduling::count_appointments_by_hour,
        handlers::orders::create_purchase_order,
        handlers::orders::update_purchase_order,
        handlers::orders::change_purchase_order_state,
        handlers::orders::create_invoice,
        handlers::orders::calculate_subtotal,
        handlers::orders::calculate_total,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::scheduling::AppointmentRequest,
            dtos::sales::CreatePurchaseOrderRequest,
            dtos::sales::UpdatePurchaseOrderRequest,
            dtos::sales::ChangeStateRequest,
            dtos::sales::CreateInvoiceRequest,
            dtos::sales::AdjustmentRequest,
            dtos::sales::SubtotalRequest,
            dtos::sales::SubtotalResponse,
            dtos::sales::TotalRequest,
            models::Appointment,
            models::HourSlot,
            models::LineItem,
            models::PurchaseOrder,
            models::Invoice,
            models::StateChange,
            models::OrderStateType,
            models::Adjustment,
            services::billing::Totals,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Scheduling", description = "Hourly appointment slots"),
        (name = "Purchase Orders", description = "Order lifecycle: pending, paid, cancelled"),
        (name = "Billing", description = "Invoices and money math"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "caller_email",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(CALLER_EMAIL_HEADER))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: BackofficeConfig,
    pub db: Database,
    pub permissions: Arc<dyn PermissionSource>,
    pub activity: Arc<dyn ActivityLog>,
    pub ip_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Start the audit trail for one request. Fails with 500 when the first
    /// log line cannot be written.
    pub async fn audit(&self, caller: &Caller, action: &str) -> Result<RequestAudit, AppError> {
        RequestAudit::open(
            self.activity.clone(),
            self.permissions.clone(),
            caller,
            action,
        )
        .await
    }
}

fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/permission", get(access::list_permissions))
        .route("/permission/searchById", get(access::search_permissions_by_id))
        .route("/permission/searchByName", get(access::search_permissions_by_name))
        .route("/permission/:id", get(access::get_permission))
        .route("/roles", get(access::list_roles))
        .route("/roles/searchByName", get(access::search_roles_by_name))
        .route("/roles/searchById", get(access::search_roles_by_id))
        .route("/roles/:id", get(access::get_role))
        .route("/roles/:id/permissions", get(access::list_role_permissions))
        .route("/roles/:id/exists", get(access::role_exists))
        .route("/user-types", get(access::list_user_types))
        .route("/user-types/searchById", get(access::search_user_types_by_id))
        .route("/user-types/searchByName", get(access::search_user_types_by_name))
        .route("/user-types/:id", get(access::get_user_type))
        .route("/user-types/:id/exists", get(access::user_type_exists))
        .route("/user-state-type", get(access::list_user_state_types))
        .route("/user-state-type/:id", get(access::get_user_state_type))
        .route("/identifier-type", get(access::list_identifier_types))
        .route("/identifier-type/:id", get(access::get_identifier_type))
        .route("/user", get(users::list_users).post(users::create_user))
        .route("/user/searchByID", get(users::search_users_by_id))
        .route("/user/searchByEmail", get(users::search_users_by_email))
        .route("/user/:id", get(users::get_user).put(users::update_user))
        .route("/user/:id/state", patch(users::update_user_state))
        // The first segment carries the email here.
        .route("/user/:id/permissions/:code", get(users::check_user_permission))
        .route("/logs/:email", get(users::list_user_logs))
}

fn people_routes() -> Router<AppState> {
    Router::new()
        .route("/employee", get(people::list_employees).post(people::create_employee))
        .route("/employee/searchEmployeesByName", get(people::search_employees_by_name))
        .route("/employee/searchById", get(people::search_employees_by_id))
        .route(
            "/employee/:id",
            get(people::get_employee)
                .put(people::update_employee)
                .delete(people::delete_employee),
        )
        .route("/customers", get(people::list_customers).post(people::create_customer))
        .route("/customers/searchById", get(people::search_customers_by_id))
        .route("/customers/searchByName", get(people::search_customers_by_name))
        .route("/customers/searchByLastName", get(people::search_customers_by_last_name))
        .route("/customers/email/:email", get(people::get_customer_by_email))
        .route("/customers/personal-id/:personal_id", get(people::get_customer_by_personal_id))
        .route("/customers/:id", get(people::get_customer).put(people::update_customer))
        .route("/comments", get(people::list_comments).post(people::create_comment))
        .route("/comments/searchByEmail", get(people::search_comments_by_email))
        .route("/comments/searchByName", get(people::search_comments_by_name))
        .route("/comments/searchById", get(people::search_comments_by_id))
        .route("/comments/:id", get(people::get_comment).put(people::update_comment))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/item-type", get(catalog::list_item_types))
        .route("/item-type/:id", get(catalog::get_item_type))
        .route("/item", get(catalog::list_items).post(catalog::create_item))
        .route("/item/searchById", get(catalog::search_items_by_id))
        .route("/item/searchByName", get(catalog::search_items_by_name))
        .route("/item/:id", get(catalog::get_item).put(catalog::update_item))
        .route("/item/:id/state", patch(catalog::update_item_state))
        .route("/item/:id/stock", get(catalog::check_stock))
        .route("/historical-item-prices/:id", get(catalog::list_item_price_history))
}

fn scheduling_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/appointments",
            get(scheduling::list_appointments).post(scheduling::create_appointment),
        )
        .route("/appointments/hours", get(scheduling::count_appointments_by_hour))
        .route("/appointments/state", get(scheduling::list_appointments_by_state))
        .route("/appointments/searchById", get(scheduling::search_appointments_by_id))
        .route(
            "/appointments/searchByCustomerId",
            get(scheduling::search_appointments_by_customer_id),
        )
        .route(
            "/appointments/customers/:id",
            get(scheduling::list_appointments_by_customer),
        )
        .route(
            "/appointments/customers/:id/slot",
            get(scheduling::get_appointment_by_customer_and_date),
        )
        .route(
            "/appointments/:id",
            get(scheduling::get_appointment)
                .put(scheduling::update_appointment)
                .delete(scheduling::delete_appointment),
        )
}

fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/order-state-types", get(orders::list_order_state_types))
        .route("/order-state-types/:id", get(orders::get_order_state_type))
        .route(
            "/purchase-orders",
            get(orders::list_purchase_orders).post(orders::create_purchase_order),
        )
        .route("/purchase-orders/searchByID", get(orders::search_purchase_orders_by_id))
        .route(
            "/purchase-orders/customers/:id",
            get(orders::list_purchase_orders_by_customer),
        )
        .route("/purchase-orders/seller/:id", get(orders::list_purchase_orders_by_seller))
        .route("/purchase-orders/state/:id", get(orders::list_purchase_orders_by_state))
        .route(
            "/purchase-orders/:id",
            get(orders::get_purchase_order).put(orders::update_purchase_order),
        )
        .route(
            "/purchase-orders/:id/state",
            patch(orders::change_purchase_order_state),
        )
        .route("/invoices", get(orders::list_invoices).post(orders::create_invoice))
        .route("/invoices/searchById", get(orders::search_invoices_by_id))
        .route(
            "/invoices/searchByCustomerPersonalId",
            get(orders::search_invoices_by_customer_personal_id),
        )
        .route("/invoices/:id", get(orders::get_invoice))
        .route(
            "/discount-types",
            get(orders::list_discount_types).post(orders::create_discount_type),
        )
        .route("/discount-types/:id", get(orders::get_discount_type))
        .route("/tax-types", get(orders::list_tax_types).post(orders::create_tax_type))
        .route("/tax-types/:id", get(orders::get_tax_type))
        .route("/billing/subtotal", post(orders::calculate_subtotal))
        .route("/billing/total", post(orders::calculate_total))
}

fn finance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/external-sales",
            get(finance::list_external_sales).post(finance::create_external_sale),
        )
        .route("/external-sales/:id", get(finance::get_external_sale))
        .route(
            "/additional-expenses",
            get(finance::list_additional_expenses).post(finance::create_additional_expense),
        )
        .route(
            "/additional-expenses/:id",
            get(finance::get_additional_expense)
                .put(finance::update_additional_expense)
                .delete(finance::delete_additional_expense),
        )
        .route("/sales-report", get(finance::sales_report))
}

pub fn build_router(state: AppState) -> Router {
    let ip_limiter = state.ip_rate_limiter.clone();

    let allowed_origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(access_routes())
        .merge(people_routes())
        .merge(catalog_routes())
        .merge(scheduling_routes())
        .merge(sales_routes())
        .merge(finance_routes())
        .with_state(state)
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let header = |name: &str| {
                request
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-")
                    .to_string()
            };

            tracing::info_span!(
                "http_request",
                request_id = %header("x-request-id"),
                user_email = %header(CALLER_EMAIL_HEADER),
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(CALLER_EMAIL_HEADER),
                ]),
        )
}
