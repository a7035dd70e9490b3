//! SQLite backend. Uniqueness of url and fingerprint is enforced by the
//! schema, making the database the final arbiter of dedup races.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use nb_core::{
    AnalysisResult, Error, NewsItem, NewsStore, ProcessingState, Result, StoreStats,
};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        fingerprint TEXT NOT NULL UNIQUE,
        discovered_at TEXT NOT NULL,
        published_at TEXT,
        raw_content TEXT NOT NULL,
        clean_content TEXT NOT NULL,
        state INTEGER NOT NULL DEFAULT 0,
        analysis TEXT
    )
    "#,
    // Add future migrations here
];

const PUBLISHED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn state_code(state: ProcessingState) -> i64 {
    match state {
        ProcessingState::Unprocessed => 0,
        ProcessingState::Relevant => 1,
        ProcessingState::NotRelevant => 2,
    }
}

fn state_from_code(code: i64) -> Result<ProcessingState> {
    match code {
        0 => Ok(ProcessingState::Unprocessed),
        1 => Ok(ProcessingState::Relevant),
        2 => Ok(ProcessingState::NotRelevant),
        other => Err(Error::Storage(format!("unknown state code {}", other))),
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteStore {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path.display()))
            .await
            .map_err(|e| Error::Storage(format!("failed to connect to database: {}", e)))?;

        for (index, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {}: {}", index, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_item(row: &SqliteRow) -> Result<NewsItem> {
        let discovered_at = chrono::DateTime::parse_from_rfc3339(row.get("discovered_at"))
            .map_err(|e| Error::Storage(format!("failed to parse discovered_at: {}", e)))?
            .with_timezone(&chrono::Utc);

        let published_at = row
            .get::<Option<String>, _>("published_at")
            .map(|value| {
                NaiveDateTime::parse_from_str(&value, PUBLISHED_FORMAT)
                    .map_err(|e| Error::Storage(format!("failed to parse published_at: {}", e)))
            })
            .transpose()?;

        let analysis = row
            .get::<Option<String>, _>("analysis")
            .map(|value| serde_json::from_str::<AnalysisResult>(&value))
            .transpose()?;

        Ok(NewsItem {
            id: Some(row.get::<i64, _>("id")),
            title: row.get("title"),
            url: row.get("url"),
            fingerprint: row.get("fingerprint"),
            discovered_at,
            published_at,
            raw_content: row.get("raw_content"),
            clean_content: row.get("clean_content"),
            state: state_from_code(row.get::<i64, _>("state"))?,
            analysis,
        })
    }

    async fn count_where(&self, state: Option<ProcessingState>) -> Result<u64> {
        let count: i64 = match state {
            Some(state) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM news_items WHERE state = ?")
                    .bind(state_code(state))
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM news_items")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| Error::Storage(format!("failed to count items: {}", e)))?;
        Ok(count as u64)
    }
}

#[async_trait]
impl NewsStore for SqliteStore {
    async fn exists_by_url_or_title(&self, title: &str, url: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM news_items WHERE url = ? OR title = ?",
        )
        .bind(url)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to check existence: {}", e)))?;
        Ok(count > 0)
    }

    async fn insert(&self, item: &NewsItem) -> Result<i64> {
        let published_at = item
            .published_at
            .map(|dt| dt.format(PUBLISHED_FORMAT).to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO news_items
            (title, url, fingerprint, discovered_at, published_at, raw_content, clean_content, state, analysis)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.fingerprint)
        .bind(item.discovered_at.to_rfc3339())
        .bind(published_at)
        .bind(&item.raw_content)
        .bind(&item.clean_content)
        .bind(state_code(item.state))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::Conflict(item.url.clone()))
            }
            Err(e) => Err(Error::Storage(format!("failed to insert item: {}", e))),
        }
    }

    async fn list_unprocessed(&self) -> Result<Vec<NewsItem>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM news_items
            WHERE state = 0
            ORDER BY discovered_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to list unprocessed items: {}", e)))?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn mark_processed(
        &self,
        id: i64,
        state: ProcessingState,
        analysis: &AnalysisResult,
    ) -> Result<()> {
        if !state.is_terminal() {
            return Err(Error::Storage(
                "mark_processed requires a terminal state".to_string(),
            ));
        }
        let payload = serde_json::to_string(analysis)?;
        let result = sqlx::query("UPDATE news_items SET state = ?, analysis = ? WHERE id = ?")
            .bind(state_code(state))
            .bind(payload)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("failed to update item {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(format!("no item with id {}", id)));
        }
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total: self.count_where(None).await?,
            unprocessed: self.count_where(Some(ProcessingState::Unprocessed)).await?,
            relevant: self.count_where(Some(ProcessingState::Relevant)).await?,
            not_relevant: self.count_where(Some(ProcessingState::NotRelevant)).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn item(title: &str, url: &str) -> NewsItem {
        NewsItem {
            id: None,
            title: title.to_string(),
            url: url.to_string(),
            fingerprint: format!("{}|{}", title, url),
            discovered_at: Utc::now(),
            published_at: chrono::NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0),
            raw_content: "raw".to_string(),
            clean_content: "clean".to_string(),
            state: ProcessingState::Unprocessed,
            analysis: None,
        }
    }

    #[tokio::test]
    async fn test_roundtrip_and_conflict() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).await.unwrap();

        let id = store.insert(&item("כותרת", "https://a")).await.unwrap();
        assert!(id > 0);

        let err = store.insert(&item("אחרת", "https://a")).await.unwrap_err();
        assert!(err.is_conflict());

        let unprocessed = store.list_unprocessed().await.unwrap();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].title, "כותרת");
        assert_eq!(
            unprocessed[0].published_at,
            chrono::NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
        );
    }

    #[tokio::test]
    async fn test_mark_processed_persists_analysis() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).await.unwrap();
        let id = store.insert(&item("כותרת", "https://a")).await.unwrap();

        let analysis = AnalysisResult {
            is_relevant: false,
            relevance_reason: "ספורט".to_string(),
            research_findings: None,
            technical_analysis: None,
            final_article: None,
            model_used: "test".to_string(),
            processed_at: Utc::now(),
        };
        store
            .mark_processed(id, ProcessingState::NotRelevant, &analysis)
            .await
            .unwrap();

        assert!(store.list_unprocessed().await.unwrap().is_empty());
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.not_relevant, 1);
    }
}
