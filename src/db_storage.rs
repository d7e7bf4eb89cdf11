use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::errors::{AppError, ResultExt};
use crate::models::{Ad, AdUpdate, Lead, NewAd, NewLead};

/// Outcome of a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

/// Outcome of an idempotent lead insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadInsert {
    Inserted,
    Duplicate,
}

/// Storage adapter for ads and leads.
///
/// "Most recent first" means highest id first; ids only ever grow.
#[derive(Clone)]
pub struct AdStorage {
    pool: SqlitePool,
}

impl AdStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new ad and returns its assigned id.
    pub async fn insert_ad(&self, ad: &NewAd) -> Result<i64, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO ads (
                service_type,
                location,
                status,
                budget,
                max_daily_spend,
                image_url,
                customer_phone,
                ad_content,
                metadata,
                created_at,
                updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ad.service_type)
        .bind(&ad.location)
        .bind(&ad.status)
        .bind(ad.budget)
        .bind(ad.max_daily_spend)
        .bind(&ad.image_url)
        .bind(&ad.customer_phone)
        .bind(&ad.ad_content)
        .bind(&ad.metadata)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("inserting ad")?;

        let id = result.last_insert_rowid();
        tracing::info!("✓ Ad {} stored (service_type={})", id, ad.service_type);
        Ok(id)
    }

    pub async fn get_ad_by_id(&self, id: i64) -> Result<Option<Ad>, AppError> {
        let ad = sqlx::query_as::<_, Ad>("SELECT * FROM ads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ad)
    }

    /// Newest ad carrying the campaign id, if any.
    pub async fn get_ad_by_campaign_id(&self, campaign_id: &str) -> Result<Option<Ad>, AppError> {
        let ad = sqlx::query_as::<_, Ad>(
            "SELECT * FROM ads WHERE campaign_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ad)
    }

    /// Overwrites only the supplied columns and refreshes `updated_at`.
    pub async fn update_ad(&self, id: i64, update: &AdUpdate) -> Result<UpdateOutcome, AppError> {
        if update.is_empty() {
            return Err(AppError::BadRequest(
                "No valid fields to update".to_string(),
            ));
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE ads SET ");
        let mut columns = builder.separated(", ");
        for (field, value) in update.changes() {
            columns.push(format!("{} = ", field.column()));
            columns.push_bind_unseparated(value.clone());
        }
        columns.push("updated_at = ");
        columns.push_bind_unseparated(Utc::now());
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .context(format!("updating ad {}", id))?;

        if result.rows_affected() == 0 {
            tracing::warn!("No ad found to update: id={}", id);
            return Ok(UpdateOutcome::NotFound);
        }

        tracing::info!("✓ Ad {} updated ({} field(s))", id, update.changes().len());
        Ok(UpdateOutcome::Updated)
    }

    pub async fn list_ads(&self) -> Result<Vec<Ad>, AppError> {
        let ads = sqlx::query_as::<_, Ad>("SELECT * FROM ads ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(ads)
    }

    /// Inserts a lead unless its `lead_id` is already stored.
    pub async fn insert_lead_ignore_duplicate(
        &self,
        lead: &NewLead,
    ) -> Result<LeadInsert, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO leads (
                lead_id,
                campaign_id,
                ad_id,
                name,
                email,
                phone,
                zip_code,
                service_interest,
                message,
                created_time,
                logged_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&lead.lead_id)
        .bind(&lead.campaign_id)
        .bind(&lead.ad_id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.zip_code)
        .bind(&lead.service_interest)
        .bind(&lead.message)
        .bind(&lead.created_time)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("inserting lead")?;

        if result.rows_affected() == 0 {
            tracing::debug!("Duplicate lead ignored: lead_id={:?}", lead.lead_id);
            Ok(LeadInsert::Duplicate)
        } else {
            tracing::info!("✓ Lead stored: lead_id={:?}", lead.lead_id);
            Ok(LeadInsert::Inserted)
        }
    }

    pub async fn list_leads(&self) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(leads)
    }
}
