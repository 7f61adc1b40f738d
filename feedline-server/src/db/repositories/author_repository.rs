use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use feedline_types::{Author, AuthorPatch};

use crate::db::DbPool;

use super::push_assignment;

/// Author attributes extracted from one import row, keyed by email.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub bio: String,
    pub follower_count: i64,
    pub verified: bool,
}

pub struct AuthorRepository {
    pool: DbPool,
}

impl AuthorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get author by ID
    pub fn get_by_id(&self, author_id: i64) -> Result<Option<Author>> {
        let conn = self.pool.get()?;
        let author = conn
            .query_row(
                "SELECT id, first_name, last_name, email, company, job_title, bio, follower_count, verified
                 FROM authors
                 WHERE id = ?",
                [author_id],
                row_to_author,
            )
            .optional()?;
        Ok(author)
    }

    /// Get author by email (the natural key)
    pub fn get_by_email(&self, email: &str) -> Result<Option<Author>> {
        let conn = self.pool.get()?;
        let author = conn
            .query_row(
                "SELECT id, first_name, last_name, email, company, job_title, bio, follower_count, verified
                 FROM authors
                 WHERE email = ?",
                [email],
                row_to_author,
            )
            .optional()?;
        Ok(author)
    }

    /// Look up an author by email, creating one when absent.
    ///
    /// For an existing author only the non-empty provided fields refresh the
    /// stored record; empty values never overwrite data on this path. New
    /// authors created here are trusted by default (`verified = true`),
    /// unlike imported ones which keep the source data's flag.
    pub fn get_or_create(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        company: Option<&str>,
        job_title: Option<&str>,
    ) -> Result<i64> {
        let conn = self.pool.get()?;

        let existing: Option<i64> = conn
            .query_row("SELECT id FROM authors WHERE email = ?", [email], |row| {
                row.get(0)
            })
            .optional()?;

        if let Some(author_id) = existing {
            let mut assignments: Vec<String> = Vec::new();
            let mut params: Vec<Value> = Vec::new();

            for (column, value) in [
                ("first_name", Some(first_name)),
                ("last_name", Some(last_name)),
                ("company", company),
                ("job_title", job_title),
            ] {
                if let Some(value) = value {
                    if !value.is_empty() {
                        assignments.push(format!("{column} = ?"));
                        params.push(Value::Text(value.to_string()));
                    }
                }
            }

            if !assignments.is_empty() {
                params.push(Value::Integer(author_id));
                let sql = format!(
                    "UPDATE authors SET {} WHERE id = ?",
                    assignments.join(", ")
                );
                conn.execute(&sql, params_from_iter(params))
                    .context("Failed to refresh author fields")?;
                tracing::debug!(author_id, email, "Updated existing author");
            }

            return Ok(author_id);
        }

        conn.execute(
            "INSERT INTO authors (first_name, last_name, email, company, job_title, bio, follower_count, verified)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![first_name, last_name, email, company, job_title, "", 0i64, true],
        )
        .context("Failed to create author")?;
        let author_id = conn.last_insert_rowid();
        tracing::info!(author_id, email, "Created new author");
        Ok(author_id)
    }

    /// Check whether an email can be assigned to the given author.
    /// Returns false when another author already uses it; an unchanged
    /// email skips the lookup entirely.
    pub fn email_available(&self, email: &str, author_id: i64, current_email: &str) -> Result<bool> {
        if email == current_email {
            tracing::debug!(author_id, "Email unchanged, skipping uniqueness check");
            return Ok(true);
        }

        let conn = self.pool.get()?;
        let taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM authors WHERE email = ? AND id != ?",
                params![email, author_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(taken.is_none())
    }

    /// Apply a partial update built from a PUT request.
    pub fn apply_patch(&self, author_id: i64, patch: &AuthorPatch) -> Result<()> {
        let mut assignments: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        push_assignment(&mut assignments, &mut params, "first_name", &patch.first_name);
        push_assignment(&mut assignments, &mut params, "last_name", &patch.last_name);
        push_assignment(&mut assignments, &mut params, "email", &patch.email);
        push_assignment(&mut assignments, &mut params, "company", &patch.company);
        push_assignment(&mut assignments, &mut params, "job_title", &patch.job_title);

        if assignments.is_empty() {
            return Ok(());
        }

        params.push(Value::Integer(author_id));
        let sql = format!("UPDATE authors SET {} WHERE id = ?", assignments.join(", "));

        let conn = self.pool.get()?;
        conn.execute(&sql, params_from_iter(params))
            .context("Failed to update author")?;
        Ok(())
    }

    /// Bulk "insert or ignore" for the importer: a duplicate email is
    /// silently skipped, never overwritten. Committed once.
    pub fn insert_ignore_batch(&self, authors: &[AuthorSeed]) -> Result<usize> {
        if authors.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction()
            .context("Failed to open author insert transaction")?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO authors
                 (first_name, last_name, email, company, job_title, bio, follower_count, verified)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for author in authors {
                stmt.execute(params![
                    author.first_name,
                    author.last_name,
                    author.email,
                    author.company,
                    author.job_title,
                    author.bio,
                    author.follower_count,
                    author.verified,
                ])?;
            }
        }
        tx.commit().context("Failed to commit author batch")?;
        Ok(authors.len())
    }

    /// Reload the full email to id mapping from storage, so the importer
    /// always resolves against durable ids rather than in-memory state.
    pub fn email_id_map(&self) -> Result<HashMap<String, i64>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT email, id FROM authors")?;
        let map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(map)
    }
}

fn row_to_author(row: &rusqlite::Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        company: row.get(4)?,
        job_title: row.get(5)?,
        bio: row.get(6)?,
        follower_count: row.get(7)?,
        verified: row.get(8)?,
    })
}
