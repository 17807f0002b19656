//! Article comments.

use anyhow::{Context, Result};

use crate::{
    store::{now_ms, BlogStore},
    AuthorSummary, Comment,
};

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    article_id: i64,
    user_id: i64,
    author_name: String,
    content: String,
    created_at: i64,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            article_id: row.article_id,
            author: AuthorSummary {
                id: row.user_id,
                name: row.author_name,
            },
            content: row.content,
            created_at: row.created_at,
        }
    }
}

impl BlogStore {
    /// Comments of an article, oldest first.
    pub async fn list_comments(&self, article_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.article_id, c.user_id, u.name AS author_name, c.content, c.created_at \
             FROM comments c JOIN users u ON u.id = c.user_id \
             WHERE c.article_id = ? ORDER BY c.created_at, c.id",
        )
        .bind(article_id)
        .fetch_all(self.pool())
        .await
        .with_context(|| format!("failed to list comments of article {article_id}"))?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    /// Append a trimmed comment by `user_id`.
    pub async fn add_comment(&self, article_id: i64, user_id: i64, content: &str) -> Result<Comment> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (article_id, user_id, content, created_at) VALUES (?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(article_id)
        .bind(user_id)
        .bind(content.trim())
        .bind(now_ms())
        .fetch_one(self.pool())
        .await
        .with_context(|| format!("failed to add comment to article {article_id}"))?;

        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.article_id, c.user_id, u.name AS author_name, c.content, c.created_at \
             FROM comments c JOIN users u ON u.id = c.user_id WHERE c.id = ?",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .with_context(|| format!("failed to reload comment {id}"))?;
        Ok(row.into())
    }
}
