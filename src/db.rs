use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS ads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        service_type TEXT NOT NULL CHECK (length(service_type) > 0),
        location TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'pending_approval',
        campaign_id TEXT,
        ad_set_id TEXT,
        fb_ad_ids TEXT,
        budget REAL,
        max_daily_spend REAL DEFAULT 50,
        image_url TEXT,
        customer_phone TEXT,
        ad_content TEXT,
        metadata TEXT,
        error_details TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_ads_campaign_id ON ads (campaign_id)",
    r#"
    CREATE TABLE IF NOT EXISTS leads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        lead_id TEXT UNIQUE,
        campaign_id TEXT,
        ad_id TEXT,
        name TEXT,
        email TEXT,
        phone TEXT,
        zip_code TEXT,
        service_interest TEXT,
        message TEXT,
        created_time TEXT,
        logged_at TEXT NOT NULL
    )
    "#,
];

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the SQLite database behind `database_url`.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = if in_memory {
            // Every connection must see the same in-memory database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Creates the `ads` and `leads` tables if they are absent.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Schema ensured for ads and leads");
        Ok(())
    }

    /// Connects and ensures the schema in one step.
    pub async fn open(database_url: &str) -> anyhow::Result<Self> {
        let db = Self::connect(database_url).await?;
        db.migrate().await?;
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::open("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('ads', 'leads') ORDER BY name",
        )
        .fetch_all(&db.pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["ads".to_string(), "leads".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_service_type_rejected_by_schema() {
        let db = Database::open("sqlite::memory:").await.unwrap();
        let result = sqlx::query(
            "INSERT INTO ads (service_type, created_at, updated_at) VALUES ('', 'now', 'now')",
        )
        .execute(&db.pool)
        .await;
        assert!(result.is_err());
    }
}
