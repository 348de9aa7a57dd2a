use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::domain::portfolio::{PortfolioEntry, Projection};
use folio_core::domain::profile::{Experience, Profile, RiskTolerance, TimeHorizon};
use folio_core::market::overview::{market_overview, EtfMarketRow};
use folio_core::market::provider::PgMarketData;
use folio_core::projection::{project_growth, NormalSampler};
use folio_core::recommend::generate_recommendation;
use folio_core::storage::profiles::{self, NewProfile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = folio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match folio_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState { pool };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/recommend", post(recommend))
        .route("/api/etfs/market-data", get(etf_market_data))
        .route("/onboard", post(create_onboard_profile))
        .route(
            "/onboard/:profile_id",
            get(get_onboard_profile).delete(delete_onboard_profile),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    pool: Option<PgPool>,
}

// The frontend sends camelCase keys; the pipeline works in snake_case.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendRequest {
    age: u32,
    income: f64,
    investment_amount: f64,
    time_horizon: TimeHorizon,
    risk_tolerance: RiskTolerance,
    experience: Experience,
}

impl RecommendRequest {
    fn into_profile(self) -> Profile {
        Profile {
            age: self.age,
            income: self.income,
            investment_amount: self.investment_amount,
            time_horizon: self.time_horizon,
            risk_tolerance: self.risk_tolerance,
            experience: self.experience,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecommendResponse {
    risk_score: f64,
    risk_tolerance: RiskTolerance,
    expected_annual_return: f64,
    portfolio: Vec<PortfolioEntry>,
    projections: Vec<Projection>,
}

async fn recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let profile = req.into_profile();
    let provider = PgMarketData::new(pool.clone());

    let recommendation = generate_recommendation(&provider, &profile)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "recommendation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let mut sampler = NormalSampler::from_entropy();
    let projections = project_growth(
        &provider,
        &recommendation.portfolio,
        profile.investment_amount,
        &mut sampler,
    )
    .await
    .map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "growth projection failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(RecommendResponse {
        risk_score: recommendation.risk_score,
        risk_tolerance: recommendation.risk_tolerance,
        expected_annual_return: recommendation.expected_annual_return,
        portfolio: recommendation.portfolio,
        projections,
    }))
}

async fn etf_market_data(
    State(state): State<AppState>,
) -> Result<Json<Vec<EtfMarketRow>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let provider = PgMarketData::new(pool.clone());
    let rows = market_overview(&provider, Utc::now().date_naive())
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "market overview failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if rows.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct OnboardRequest {
    name: String,
    age: i32,
    income_range: String,
    investment_amount: f64,
    time_horizon: String,
    risk_tolerance: String,
    investment_goals: String,
    experience: String,
}

#[derive(Debug, Serialize)]
struct OnboardResponse {
    status: &'static str,
    profile_id: i64,
}

fn validate_onboard(req: &OnboardRequest) -> Result<(), &'static str> {
    if req.name.trim().is_empty() {
        return Err("Name cannot be empty.");
    }
    if !(18..=100).contains(&req.age) {
        return Err("Age must be between 18 and 100.");
    }
    if req.investment_amount <= 0.0 {
        return Err("Investment amount must be a positive number.");
    }
    Ok(())
}

async fn create_onboard_profile(
    State(state): State<AppState>,
    Json(req): Json<OnboardRequest>,
) -> Result<(StatusCode, Json<OnboardResponse>), (StatusCode, String)> {
    let Some(pool) = &state.pool else {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "db unavailable".to_string()));
    };

    if let Err(msg) = validate_onboard(&req) {
        return Err((StatusCode::BAD_REQUEST, msg.to_string()));
    }

    let profile = NewProfile {
        name: req.name.trim().to_string(),
        age: req.age,
        income_range: req.income_range,
        investment_amount: req.investment_amount,
        time_horizon: req.time_horizon,
        risk_tolerance: req.risk_tolerance,
        investment_goals: req.investment_goals,
        experience: req.experience,
    };

    let profile_id = profiles::create_profile(pool, &profile).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        (StatusCode::INTERNAL_SERVER_ERROR, "insert failed".to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(OnboardResponse {
            status: "ok",
            profile_id,
        }),
    ))
}

async fn get_onboard_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<i64>,
) -> Result<Json<profiles::StoredProfile>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let profile = profiles::get_profile(pool, profile_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(profile))
}

async fn delete_onboard_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let deleted = profiles::delete_profile(pool, profile_id).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &folio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
