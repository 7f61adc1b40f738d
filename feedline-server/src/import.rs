//! CSV import pipeline: normalize rows, deduplicate authors by email,
//! resolve author ids from storage, then batch-insert posts.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;

use crate::db::repositories::{AuthorRepository, AuthorSeed, PostRepository, PostSeed};
use crate::db::Database;

/// Counters describing one import run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub authors_inserted: usize,
    pub posts_inserted: usize,
    /// Rows dropped during author extraction (missing email).
    pub skipped_rows: usize,
    /// Post rows whose email resolved to no stored author.
    pub missing_author: usize,
    /// Post rows with a zero or unparseable id.
    pub invalid_id: usize,
}

/// One raw CSV record. Every field is optional so a sparse or damaged file
/// still loads; normalization below fills in the defaults.
#[derive(Debug, Default, Deserialize)]
struct RawRow {
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    author_first_name: Option<String>,
    #[serde(default)]
    author_last_name: Option<String>,
    #[serde(default)]
    author_email: Option<String>,
    #[serde(default)]
    author_company: Option<String>,
    #[serde(default)]
    author_job_title: Option<String>,
    #[serde(default)]
    author_bio: Option<String>,
    #[serde(default)]
    author_follower_count: Option<String>,
    #[serde(default)]
    author_verified: Option<String>,
    #[serde(default)]
    post_text: Option<String>,
    #[serde(default)]
    post_date: Option<String>,
    #[serde(default)]
    likes: Option<String>,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default)]
    shares: Option<String>,
    #[serde(default)]
    total_engagements: Option<String>,
    #[serde(default)]
    engagement_rate: Option<String>,
    #[serde(default)]
    post_image_svg: Option<String>,
    #[serde(default)]
    post_category: Option<String>,
    #[serde(default)]
    post_tags: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

/// A fully normalized dataset row.
#[derive(Debug, Clone)]
struct Row {
    post_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    company: String,
    job_title: String,
    bio: String,
    follower_count: i64,
    verified: bool,
    text: String,
    post_date: String,
    likes: i64,
    comments: i64,
    shares: i64,
    total_engagements: i64,
    engagement_rate: f64,
    svg_image: String,
    category: String,
    tags: String,
    location: String,
}

/// Import the dataset at `path` into the database.
///
/// A missing file is a no-op, not an error. Row-level problems are counted
/// and skipped; a batch-insert failure aborts the import and is surfaced to
/// the caller (who treats it as non-fatal to startup).
pub fn import_csv(db: &Database, path: &Path) -> Result<ImportSummary> {
    if !path.exists() {
        tracing::warn!("CSV file not found: {}", path.display());
        return Ok(ImportSummary::default());
    }

    tracing::info!("Starting CSV import from '{}'...", path.display());
    let rows = read_rows(path)?;
    if rows.is_empty() {
        tracing::warn!("CSV file is empty, nothing to import");
        return Ok(ImportSummary::default());
    }
    tracing::info!("CSV loaded successfully: {} rows", rows.len());

    import_rows(db, &rows)
}

/// Import already-normalized rows. Split out from the file handling so
/// tests can drive the pipeline directly.
fn import_rows(db: &Database, rows: &[Row]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let author_repo = AuthorRepository::new(db.pool.clone());
    let post_repo = PostRepository::new(db.pool.clone());

    // Authors: first occurrence per distinct non-empty email wins.
    let authors = extract_unique_authors(rows, &mut summary);
    if authors.is_empty() {
        tracing::warn!("No authors to insert from CSV");
        return Ok(summary);
    }
    summary.authors_inserted = author_repo
        .insert_ignore_batch(&authors)
        .context("Failed to bulk insert authors")?;
    tracing::info!("Inserted {} unique authors", summary.authors_inserted);

    // Resolve ids from storage, not from the in-memory extraction.
    let author_map = author_repo.email_id_map()?;
    tracing::debug!("Built author id map with {} authors", author_map.len());

    let mut posts: Vec<PostSeed> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(&author_id) = author_map.get(&row.email) else {
            summary.missing_author += 1;
            continue;
        };
        if row.post_id <= 0 {
            summary.invalid_id += 1;
            continue;
        }
        posts.push(PostSeed {
            id: row.post_id,
            author_id,
            text: row.text.clone(),
            post_date: row.post_date.clone(),
            likes: row.likes,
            comments: row.comments,
            shares: row.shares,
            total_engagements: row.total_engagements,
            engagement_rate: row.engagement_rate,
            svg_image: none_if_empty(&row.svg_image),
            category: none_if_empty(&row.category),
            tags: none_if_empty(&row.tags),
            location: none_if_empty(&row.location),
        });
    }

    if summary.missing_author > 0 {
        tracing::warn!(
            "Skipped {} posts due to missing author mapping",
            summary.missing_author
        );
    }
    if summary.invalid_id > 0 {
        tracing::warn!("Skipped {} posts with an invalid id", summary.invalid_id);
    }

    summary.posts_inserted = post_repo
        .replace_all(&posts)
        .context("Failed to bulk insert posts")?;

    tracing::info!(
        "CSV import completed successfully! Inserted {} posts and {} authors",
        summary.posts_inserted,
        summary.authors_inserted
    );
    Ok(summary)
}

fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to read CSV file '{}'", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<RawRow>().enumerate() {
        match record {
            Ok(raw) => rows.push(normalize_row(raw, idx)),
            Err(e) => {
                // Best-effort import: a malformed row is dropped, not fatal.
                tracing::error!("Failed to process row {}: {}", idx + 1, e);
            }
        }
    }
    Ok(rows)
}

fn normalize_row(raw: RawRow, idx: usize) -> Row {
    Row {
        // A dataset without an id column gets 1-based sequential ids; an id
        // that is present but unparseable becomes 0 and is skipped later.
        post_id: match raw.post_id.as_deref() {
            None | Some("") => idx as i64 + 1,
            Some(value) => coerce_int(Some(value)),
        },
        first_name: raw.author_first_name.unwrap_or_default(),
        last_name: raw.author_last_name.unwrap_or_default(),
        email: raw.author_email.unwrap_or_default(),
        company: raw.author_company.unwrap_or_default(),
        job_title: raw.author_job_title.unwrap_or_default(),
        bio: raw.author_bio.unwrap_or_default(),
        follower_count: coerce_int(raw.author_follower_count.as_deref()),
        verified: coerce_bool(raw.author_verified.as_deref()),
        text: raw.post_text.unwrap_or_default(),
        post_date: coerce_date(raw.post_date.as_deref()),
        likes: coerce_int(raw.likes.as_deref()),
        comments: coerce_int(raw.comments.as_deref()),
        shares: coerce_int(raw.shares.as_deref()),
        total_engagements: coerce_int(raw.total_engagements.as_deref()),
        engagement_rate: coerce_float(raw.engagement_rate.as_deref()),
        svg_image: raw.post_image_svg.unwrap_or_default(),
        category: raw.post_category.unwrap_or_default(),
        tags: raw.post_tags.unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
    }
}

fn extract_unique_authors(rows: &[Row], summary: &mut ImportSummary) -> Vec<AuthorSeed> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut authors = Vec::new();

    for row in rows {
        if row.email.is_empty() {
            summary.skipped_rows += 1;
            continue;
        }
        if !seen.insert(row.email.as_str()) {
            continue;
        }
        authors.push(AuthorSeed {
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            email: row.email.clone(),
            company: none_if_empty(&row.company),
            job_title: none_if_empty(&row.job_title),
            bio: row.bio.clone(),
            follower_count: row.follower_count,
            verified: row.verified,
        });
    }

    if summary.skipped_rows > 0 {
        tracing::warn!(
            "Skipped {} rows during author extraction",
            summary.skipped_rows
        );
    }
    tracing::debug!("Extracted {} unique authors from CSV", authors.len());
    authors
}

fn none_if_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Numeric coercion: parse failures become 0, fractional counts truncate.
fn coerce_int(value: Option<&str>) -> i64 {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .map(|f| f as i64)
        .unwrap_or(0)
}

fn coerce_float(value: Option<&str>) -> f64 {
    value
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn coerce_bool(value: Option<&str>) -> bool {
    match value.map(|s| s.trim().to_ascii_lowercase()) {
        Some(s) => match s.as_str() {
            "true" | "yes" | "t" | "y" => true,
            "false" | "no" | "f" | "n" | "" => false,
            other => other.parse::<f64>().map(|n| n != 0.0).unwrap_or(false),
        },
        None => false,
    }
}

/// Timestamps keep the source format when parseable, otherwise default to
/// now. Bare dates get a midnight time component.
fn coerce_date(value: Option<&str>) -> String {
    if let Some(raw) = value {
        let raw = raw.trim();
        if NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").is_ok() {
            return raw.to_string();
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return format!("{} 00:00:00", date.format("%Y-%m-%d"));
        }
    }
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
