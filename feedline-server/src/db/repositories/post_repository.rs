use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use feedline_types::{AuthorInfo, FeedStats, Post, PostPatch, SortOption};

use crate::db::query::{order_clause, where_clause, PageRequest, PostFilter};
use crate::db::DbPool;

use super::push_assignment;

/// Posts are written in fixed-size batches during import.
const BATCH_SIZE: usize = 1000;
/// Progress is logged every N batches and on the final one.
const PROGRESS_LOG_INTERVAL: usize = 10;

const POST_WITH_AUTHOR_COLUMNS: &str = "p.id, p.text, p.post_date, p.likes, p.comments, p.shares, \
     p.total_engagements, p.engagement_rate, p.svg_image, p.category, p.tags, p.location, \
     a.first_name, a.last_name, a.email, a.company, a.job_title, a.bio, a.follower_count, a.verified";

/// A post row prepared by the importer, with an externally supplied id.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSeed {
    pub id: i64,
    pub author_id: i64,
    pub text: String,
    pub post_date: String,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub total_engagements: i64,
    pub engagement_rate: f64,
    pub svg_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub location: Option<String>,
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Fetch one page of the feed plus the total count for the same
    /// predicate, so pagination arithmetic always agrees with the data.
    pub fn page(
        &self,
        filters: &[PostFilter],
        sort: SortOption,
        request: PageRequest,
    ) -> Result<(Vec<Post>, i64)> {
        let (clause, filter_params) = where_clause(filters);
        let conn = self.pool.get()?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM posts p JOIN authors a ON p.author_id = a.id WHERE {clause}"
        );
        let total: i64 = conn
            .query_row(
                &count_sql,
                params_from_iter(filter_params.iter()),
                |row| row.get(0),
            )
            .context("Failed to count posts")?;

        let page_sql = format!(
            "SELECT {POST_WITH_AUTHOR_COLUMNS}
             FROM posts p
             JOIN authors a ON p.author_id = a.id
             WHERE {clause}
             ORDER BY {order}
             LIMIT ? OFFSET ?",
            order = order_clause(sort),
        );
        let mut stmt = conn.prepare(&page_sql)?;

        let mut values: Vec<Value> = filter_params.into_iter().map(Value::Text).collect();
        values.push(Value::Integer(request.per_page));
        values.push(Value::Integer(request.offset()));

        let posts = stmt
            .query_map(params_from_iter(values), row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((posts, total))
    }

    /// Get a single post joined with its author
    pub fn get_with_author(&self, post_id: i64) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {POST_WITH_AUTHOR_COLUMNS}
             FROM posts p
             JOIN authors a ON p.author_id = a.id
             WHERE p.id = ?"
        );
        let post = conn
            .query_row(&sql, [post_id], row_to_post)
            .optional()?;
        Ok(post)
    }

    pub fn exists(&self, post_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let found: Option<i64> = conn
            .query_row("SELECT id FROM posts WHERE id = ?", [post_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    pub fn author_id_of(&self, post_id: i64) -> Result<Option<i64>> {
        let conn = self.pool.get()?;
        let author_id = conn
            .query_row(
                "SELECT author_id FROM posts WHERE id = ?",
                [post_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(author_id)
    }

    /// Create a post dated now with zeroed engagement metrics.
    ///
    /// The id is omitted so the storage engine assigns the next rowid
    /// atomically; concurrent creates can no longer collide on a
    /// read-then-write max+1.
    pub fn create(
        &self,
        author_id: i64,
        text: &str,
        svg_image: Option<&str>,
        category: Option<&str>,
        tags: Option<&str>,
        location: Option<&str>,
    ) -> Result<i64> {
        let post_date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (author_id, text, post_date, likes, comments, shares,
                                total_engagements, engagement_rate, svg_image, category, tags, location)
             VALUES (?, ?, ?, 0, 0, 0, 0, 0.0, ?, ?, ?, ?)",
            params![author_id, text, post_date, svg_image, category, tags, location],
        )
        .context("Failed to create post")?;
        let post_id = conn.last_insert_rowid();
        tracing::info!(post_id, author_id, "Post created");
        Ok(post_id)
    }

    /// Apply a partial update built from a PUT request.
    pub fn apply_patch(&self, post_id: i64, patch: &PostPatch) -> Result<()> {
        let mut assignments: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        push_assignment(&mut assignments, &mut params, "text", &patch.text);
        push_assignment(&mut assignments, &mut params, "category", &patch.category);
        push_assignment(&mut assignments, &mut params, "svg_image", &patch.svg_image);
        push_assignment(&mut assignments, &mut params, "tags", &patch.tags);
        push_assignment(&mut assignments, &mut params, "location", &patch.location);

        if assignments.is_empty() {
            return Ok(());
        }

        params.push(Value::Integer(post_id));
        let sql = format!("UPDATE posts SET {} WHERE id = ?", assignments.join(", "));

        let conn = self.pool.get()?;
        conn.execute(&sql, params_from_iter(params))
            .context("Failed to update post")?;
        Ok(())
    }

    /// Delete a post by id. Returns false when no such post existed.
    pub fn delete(&self, post_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let deleted = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id])
            .context("Failed to delete post")?;
        Ok(deleted > 0)
    }

    /// Aggregate counters for the whole feed; all zero when it is empty.
    /// The average engagement rate is rounded to one decimal.
    pub fn stats(&self) -> Result<FeedStats> {
        let conn = self.pool.get()?;
        let stats = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(likes), 0),
                    COALESCE(SUM(comments), 0),
                    COALESCE(AVG(engagement_rate), 0.0)
             FROM posts",
            [],
            |row| {
                let avg: f64 = row.get(3)?;
                Ok(FeedStats {
                    total_posts: row.get(0)?,
                    total_likes: row.get(1)?,
                    total_comments: row.get(2)?,
                    avg_engagement_rate: (avg * 10.0).round() / 10.0,
                })
            },
        )?;
        Ok(stats)
    }

    /// Importer path: "insert or replace by id" so re-importing a post id
    /// overwrites the row. All batches run in one transaction; any batch
    /// failure rolls back the whole import.
    pub fn replace_all(&self, posts: &[PostSeed]) -> Result<usize> {
        if posts.is_empty() {
            return Ok(0);
        }

        let total_batches = posts.len().div_ceil(BATCH_SIZE);
        tracing::info!(
            "Inserting {} posts in {} batches (batch size: {})...",
            posts.len(),
            total_batches,
            BATCH_SIZE
        );

        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction()
            .context("Failed to open post insert transaction")?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO posts
                 (id, author_id, text, post_date, likes, comments, shares,
                  total_engagements, engagement_rate, svg_image, category, tags, location)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;

            for (batch_num, batch) in posts.chunks(BATCH_SIZE).enumerate() {
                for post in batch {
                    stmt.execute(params![
                        post.id,
                        post.author_id,
                        post.text,
                        post.post_date,
                        post.likes,
                        post.comments,
                        post.shares,
                        post.total_engagements,
                        post.engagement_rate,
                        post.svg_image,
                        post.category,
                        post.tags,
                        post.location,
                    ])
                    .context("Failed to insert post batch")?;
                }
                inserted += batch.len();

                let batch_num = batch_num + 1;
                if batch_num % PROGRESS_LOG_INTERVAL == 0 || batch_num == total_batches {
                    tracing::info!(
                        "Progress: inserted {}/{} posts ({}/{} batches)",
                        inserted,
                        posts.len(),
                        batch_num,
                        total_batches
                    );
                }
            }
        }
        tx.commit().context("Failed to commit post batches")?;
        Ok(inserted)
    }
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        post_date: row.get(2)?,
        likes: row.get(3)?,
        comments: row.get(4)?,
        shares: row.get(5)?,
        total_engagements: row.get(6)?,
        engagement_rate: row.get(7)?,
        svg_image: row.get(8)?,
        category: row.get(9)?,
        tags: row.get(10)?,
        location: row.get(11)?,
        author: AuthorInfo {
            first_name: row.get(12)?,
            last_name: row.get(13)?,
            email: row.get(14)?,
            company: row.get(15)?,
            job_title: row.get(16)?,
            bio: row.get(17)?,
            follower_count: row.get(18)?,
            verified: row.get(19)?,
        },
    })
}
