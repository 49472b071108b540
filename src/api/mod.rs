//! JSON HTTP API under `/api`.
//!
//! Handlers are thin: they extract, call one service or repository, and
//! map [`AppError`](crate::error::AppError) to a status code.

pub mod budgets;
pub mod clients;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod invoices;
pub mod reports;
pub mod transactions;
pub mod vendors;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerStore, PgLedgerStore};
use crate::repositories::{
    BudgetRepository, ClientRepository, EventRepository, InvoiceRepository, ReportRepository,
    TransactionRepository, VendorRepository,
};
use crate::services::{
    DashboardService, EventService, InvoiceService, LedgerService, ReportService,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub ledger: Arc<LedgerService>,
    pub events: Arc<EventService>,
    pub transactions: Arc<TransactionRepository>,
    pub clients: Arc<ClientRepository>,
    pub vendors: Arc<VendorRepository>,
    pub budgets: Arc<BudgetRepository>,
    pub invoices: Arc<InvoiceService>,
    pub reports: Arc<ReportService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppState {
    /// Production wiring: the ledger runs on the same PostgreSQL pool
    pub fn new(pool: PgPool) -> Self {
        let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(pool.clone()));
        Self::with_ledger_store(pool, store)
    }

    /// Wire every repository to `pool` and the ledger to `store`
    pub fn with_ledger_store(pool: PgPool, store: Arc<dyn LedgerStore>) -> Self {
        let event_repo = Arc::new(EventRepository::new(pool.clone()));
        let transaction_repo = Arc::new(TransactionRepository::new(pool.clone()));
        let budget_repo = Arc::new(BudgetRepository::new(pool.clone()));
        let report_repo = Arc::new(ReportRepository::new(pool.clone()));
        let invoice_repo = Arc::new(InvoiceRepository::new(pool.clone()));

        Self {
            ledger: Arc::new(LedgerService::new(store)),
            events: Arc::new(EventService::new(event_repo.clone(), budget_repo.clone())),
            reports: Arc::new(ReportService::new(report_repo.clone(), event_repo.clone())),
            dashboard: Arc::new(DashboardService::new(
                event_repo,
                transaction_repo.clone(),
                report_repo,
                invoice_repo.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(invoice_repo)),
            transactions: transaction_repo,
            clients: Arc::new(ClientRepository::new(pool.clone())),
            vendors: Arc::new(VendorRepository::new(pool.clone())),
            budgets: budget_repo,
            database: Database::new(pool),
        }
    }
}

/// CORS policy; `None` allows any origin
pub fn cors_layer(allow_origin: Option<&str>) -> AppResult<CorsLayer> {
    let origin = match allow_origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin)
                .map_err(|_| AppError::Config(format!("Invalid CORS_ALLOW_ORIGIN: {}", origin)))?;
            AllowOrigin::exact(value)
        }
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any))
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/update-financials", post(events::update_financials))
        .route(
            "/events/:id/budgets",
            get(events::list_budget_lines).put(events::set_budget_line),
        )
        // Transactions
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/transactions/categories/list", get(transactions::list_categories))
        .route(
            "/transactions/:id",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        // Clients and vendors
        .route("/clients", get(clients::list_clients).post(clients::create_client))
        .route(
            "/clients/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/vendors", get(vendors::list_vendors).post(vendors::create_vendor))
        .route(
            "/vendors/:id",
            get(vendors::get_vendor)
                .put(vendors::update_vendor)
                .delete(vendors::delete_vendor),
        )
        // Invoices
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/invoices/stats/overview", get(invoices::invoice_stats))
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/invoices/:id/send", put(invoices::send_invoice))
        .route("/invoices/:id/pay", put(invoices::pay_invoice))
        // Budgets
        .route(
            "/budget-categories",
            get(budgets::list_categories).post(budgets::create_category),
        )
        // Reports
        .route("/reports/profit-loss", get(reports::profit_loss))
        .route("/reports/cash-flow", get(reports::cash_flow))
        .route("/reports/budget-variance", get(reports::budget_variance))
        .route("/reports/event-profitability", get(reports::event_profitability))
        // Dashboard
        .route("/dashboard/overview", get(dashboard::overview))
        .route("/dashboard/kpis", get(dashboard::kpis))
        .route(
            "/dashboard/revenue-expenses-chart",
            get(dashboard::revenue_expenses_chart),
        );

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start serving `app` on `port` until `shutdown` resolves
pub async fn serve<F>(app: Router, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "connected" })),
        ),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}
