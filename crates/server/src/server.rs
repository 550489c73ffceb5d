use axum::{
    Extension, Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};
use chrono::Utc;
use chrono_tz::Tz;
use uuid::Uuid;

use std::{net::SocketAddr, sync::Arc};

use crate::{
    ServerError, accounts, clients, commands, expenses, sales, statistics, subscription, views,
};
use engine::{Engine, EngineError, Merchant};

static MERCHANT_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-merchant-id");

/// Runtime options of the HTTP server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Deny ledger routes to merchants without a running trial or plan.
    pub enforce_subscription: bool,
    /// Shared secret expected in `x-webhook-secret` on payment notifications.
    pub webhook_secret: Option<String>,
    /// Zone of the merchants' business day, for statistics.
    pub timezone: Tz,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            enforce_subscription: true,
            webhook_secret: None,
            timezone: chrono_tz::Africa::Abidjan,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub config: Arc<ServerConfig>,
}

impl ServerState {
    pub fn new(engine: Engine, config: ServerConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}

/// `TypedHeader` for the merchant identity.
///
/// Authentication happens upstream: the gateway forwards the authenticated
/// merchant id in "x-merchant-id".
#[derive(Debug)]
struct MerchantHeader(Uuid);

impl Header for MerchantHeader {
    fn name() -> &'static axum::http::HeaderName {
        &MERCHANT_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = Uuid::parse_str(value.trim()) else {
            return Err(AxumError::invalid());
        };

        Ok(MerchantHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let as_string = self.0.to_string();
        match axum::http::HeaderValue::from_str(&as_string) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-merchant-id header"),
        }
    }
}

async fn identify(
    merchant_header: Option<TypedHeader<MerchantHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(MerchantHeader(account_id))) = merchant_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let merchant = match state.engine.merchant(account_id).await {
        Ok(merchant) => merchant,
        Err(EngineError::KeyNotFound(_)) => return Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            tracing::error!("merchant lookup failed: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(merchant);
    Ok(next.run(request).await)
}

/// Refuse ledger routes with `402 Payment Required` when the merchant has no
/// access, returning the decision as body.
async fn require_access(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !state.config.enforce_subscription {
        return Ok(next.run(request).await);
    }

    let decision = state.engine.check_access(merchant.id, Utc::now()).await?;
    if !decision.has_access {
        tracing::debug!(account_id = %merchant.id, reason = ?decision.reason, "access denied");
        return Ok((
            StatusCode::PAYMENT_REQUIRED,
            Json(views::access_view(&decision)),
        )
            .into_response());
    }
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/accounts", post(accounts::register))
        .route("/subscription/plans", get(subscription::plans))
        .route("/subscription/webhook", post(subscription::webhook));

    let account = Router::new()
        .route("/accounts/me", get(accounts::me))
        .route("/subscription/check", get(subscription::check))
        .route("/subscription/info", get(subscription::info))
        .route("/subscription/activate", post(subscription::activate))
        .route("/subscription/renew", post(subscription::renew))
        .route("/subscription/cancel", post(subscription::cancel))
        .route_layer(middleware::from_fn_with_state(state.clone(), identify));

    let ledger = Router::new()
        .route("/clients", get(clients::list).post(clients::client_new))
        .route(
            "/clients/{id}",
            get(clients::get).delete(clients::delete),
        )
        .route(
            "/clients/{id}/payments",
            get(clients::payments).post(clients::payment_new),
        )
        .route("/sales", get(sales::list).post(sales::sale_new))
        .route("/sales/{id}", get(sales::get).delete(sales::delete))
        .route("/expenses", get(expenses::list).post(expenses::expense_new))
        .route(
            "/expenses/{id}",
            get(expenses::get).delete(expenses::delete),
        )
        .route("/stats/day", get(statistics::day))
        .route("/stats/month", get(statistics::month))
        .route("/stats/credits", get(statistics::credits))
        .route("/stats/overview", get(statistics::overview))
        .route("/commands", post(commands::apply))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_access))
        .route_layer(middleware::from_fn_with_state(state.clone(), identify));

    Router::new()
        .merge(public)
        .merge(account)
        .merge(ledger)
        .with_state(state)
}

pub async fn run(engine: Engine, config: ServerConfig) {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, config, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState::new(engine, config))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
