//! Per-article view counting.
//!
//! The counter is a plain atomic increment: every detail fetch adds one,
//! whoever the visitor is. Visitor rows and `article_views` events are kept
//! next to it for analytics but never consulted by the counter.

use anyhow::{Context, Result};

use crate::store::{now_ms, BlogStore};

impl BlogStore {
    /// Add `by` to the article's view counter in a single `UPDATE`.
    /// Returns `false` when the article does not exist.
    pub async fn increment_views(&self, article_id: i64, by: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET total_views = total_views + ? WHERE id = ?")
            .bind(by.max(0))
            .bind(article_id)
            .execute(self.pool())
            .await
            .with_context(|| format!("failed to increment views of article {article_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count one view and, when the client address is known, append a view event.
    pub async fn record_view(&self, article_id: i64, client_ip: Option<&str>) -> Result<()> {
        if !self.increment_views(article_id, 1).await? {
            return Ok(());
        }

        let Some(client_ip) = client_ip.map(str::trim).filter(|ip| !ip.is_empty()) else {
            return Ok(());
        };

        let now = now_ms();
        let visitor_id: i64 = sqlx::query_scalar(
            "INSERT INTO visitors (ip_address, first_seen_at, last_seen_at) VALUES (?, ?, ?) \
             ON CONFLICT(ip_address) DO UPDATE SET last_seen_at = excluded.last_seen_at \
             RETURNING id",
        )
        .bind(client_ip)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .context("failed to upsert visitor")?;

        sqlx::query("INSERT INTO article_views (visitor_id, article_id, viewed_at) VALUES (?, ?, ?)")
            .bind(visitor_id)
            .bind(article_id)
            .bind(now)
            .execute(self.pool())
            .await
            .with_context(|| format!("failed to append view event for article {article_id}"))?;
        Ok(())
    }

    /// Best-effort [`BlogStore::record_view`]: failures are logged and swallowed
    /// so the read that triggered it still succeeds.
    pub async fn track_view(&self, article_id: i64, client_ip: Option<&str>) {
        if let Err(err) = self.record_view(article_id, client_ip).await {
            tracing::warn!(article_id, "failed to track article view: {err:#}");
        }
    }
}
