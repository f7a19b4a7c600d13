use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use penny_db::{migrations, DbPool};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    collection: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub collection: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, collection: impl Into<String>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { db_pool, collection: collection.into() })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let collection = if database.status == "ready" {
        collection_check(&state.db_pool, &state.collection).await
    } else {
        HealthCheck { status: "degraded", detail: "database unreachable".to_string() }
    };
    let ready = database.status == "ready" && collection.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "penny-server runtime initialized".to_string(),
        },
        database,
        collection,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn collection_check(pool: &DbPool, collection: &str) -> HealthCheck {
    match migrations::table_exists(pool, collection).await {
        Ok(true) => {
            HealthCheck { status: "ready", detail: format!("collection `{collection}` present") }
        }
        Ok(false) => HealthCheck {
            status: "degraded",
            detail: format!("collection `{collection}` is missing; run `penny migrate`"),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("collection lookup failed: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use penny_db::{connect_with_settings, migrations};

    use crate::health::{health, HealthState};

    fn state(db_pool: penny_db::DbPool) -> State<HealthState> {
        State(HealthState { db_pool, collection: "purchase_orders".to_string() })
    }

    #[tokio::test]
    async fn health_returns_ready_when_collection_exists() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        migrations::run_pending(&pool, "purchase_orders").await.expect("schema");

        let (status, Json(payload)) = health(state(pool.clone())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.collection.status, "ready");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_is_degraded_when_collection_is_missing() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) = health(state(pool.clone())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.collection.status, "degraded");
        assert!(payload.collection.detail.contains("penny migrate"));

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) = health(state(pool)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
