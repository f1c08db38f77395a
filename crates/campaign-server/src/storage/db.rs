//! PostgreSQL campaign store

use anyhow::{Context, Result};
use async_trait::async_trait;
use campaign_core::{
    Campaign, CampaignId, CampaignStatus, CampaignStore, NewCampaign, StoreError, StoreResult,
};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::settings::Settings;

/// Columns cast to plain numeric types so rows decode the same way
/// regardless of how the table declares them.
const SELECT_CAMPAIGNS: &str = r#"
    SELECT id::bigint AS id,
           campaign_name,
           status,
           clicks::bigint AS clicks,
           cost::float8 AS cost,
           impressions::bigint AS impressions
    FROM campaigns
"#;

pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Build the pool without connecting, so the server can start while the
    /// database is down. Only a malformed URL is an error here.
    pub fn connect_lazy(settings: &Settings) -> Result<Self> {
        let options: PgConnectOptions = settings
            .database_url
            .parse()
            .context("Invalid DATABASE_URL")?;

        let mut pool_options = PgPoolOptions::new().max_connections(settings.db_max_connections);
        if let Some(secs) = settings.db_acquire_timeout_secs {
            pool_options = pool_options.acquire_timeout(Duration::from_secs(secs));
        }

        let pool = pool_options.connect_lazy_with(options);

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS campaigns (
                id SERIAL PRIMARY KEY,
                campaign_name TEXT NOT NULL,
                status TEXT NOT NULL,
                clicks INTEGER NOT NULL DEFAULT 0,
                cost NUMERIC(12, 2) NOT NULL DEFAULT 0,
                impressions INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(classify)?;

        Ok(())
    }
}

#[async_trait]
impl CampaignStore for Database {
    async fn list_campaigns(&self, status: Option<CampaignStatus>) -> StoreResult<Vec<Campaign>> {
        let sql = match status {
            Some(_) => format!("{} WHERE status = $1 ORDER BY id", SELECT_CAMPAIGNS),
            None => format!("{} ORDER BY id", SELECT_CAMPAIGNS),
        };

        let mut query = sqlx::query_as::<_, CampaignRow>(&sql);
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }

        let rows = query.fetch_all(&*self.pool).await.map_err(classify)?;

        rows.into_iter().map(Campaign::try_from).collect()
    }

    async fn get_campaign(&self, id: CampaignId) -> StoreResult<Option<Campaign>> {
        let sql = format!("{} WHERE id = $1", SELECT_CAMPAIGNS);
        let row: Option<CampaignRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(classify)?;

        row.map(Campaign::try_from).transpose()
    }

    async fn insert_campaign(&self, campaign: &NewCampaign) -> StoreResult<CampaignId> {
        // Dropping the transaction on an error path rolls it back and
        // returns the connection to the pool.
        let mut tx = self.pool.begin().await.map_err(classify)?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO campaigns (campaign_name, status, clicks, cost, impressions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id::bigint
            "#,
        )
        .bind(&campaign.campaign_name)
        .bind(&campaign.status)
        .bind(campaign.clicks)
        .bind(campaign.cost)
        .bind(campaign.impressions)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await.map_err(classify)?;

        Ok(id)
    }
}

/// Sort driver errors into the store taxonomy the router branches on.
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unreachable(err.to_string()),
        sqlx::Error::Database(_)
        | sqlx::Error::RowNotFound
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_) => StoreError::Query(err.to_string()),
        _ => StoreError::Unexpected(err.to_string()),
    }
}

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: i64,
    campaign_name: String,
    status: String,
    clicks: i64,
    cost: f64,
    impressions: i64,
}

/// `NUMERIC` admits `'NaN'`, which has no JSON representation.
impl TryFrom<CampaignRow> for Campaign {
    type Error = StoreError;

    fn try_from(r: CampaignRow) -> StoreResult<Self> {
        if !r.cost.is_finite() {
            return Err(StoreError::Query(format!(
                "campaign {} has a non-finite cost",
                r.id
            )));
        }

        Ok(Campaign {
            id: r.id,
            campaign_name: r.campaign_name,
            status: r.status,
            clicks: r.clicks,
            cost: r.cost,
            impressions: r.impressions,
        })
    }
}
