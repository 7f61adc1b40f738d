/// SQL schema for the feedline database.
/// Both statements are idempotent so initialization is safe on every startup.
///
/// Post ids are `INTEGER PRIMARY KEY` (a rowid alias): the importer supplies
/// explicit ids, while live creation omits the id and lets the storage engine
/// assign the next one atomically.
pub const SCHEMA: &str = r#"
-- Authors table (email is the natural key for deduplication)
CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    email TEXT UNIQUE NOT NULL,
    company TEXT,
    job_title TEXT,
    bio TEXT NOT NULL DEFAULT '',
    follower_count INTEGER NOT NULL DEFAULT 0,
    verified INTEGER NOT NULL DEFAULT 0
);

-- Posts table
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY,
    author_id INTEGER NOT NULL,
    text TEXT NOT NULL DEFAULT '',
    post_date TEXT NOT NULL,
    likes INTEGER NOT NULL DEFAULT 0,
    comments INTEGER NOT NULL DEFAULT 0,
    shares INTEGER NOT NULL DEFAULT 0,
    total_engagements INTEGER NOT NULL DEFAULT 0,
    engagement_rate REAL NOT NULL DEFAULT 0.0,
    svg_image TEXT,
    category TEXT,
    tags TEXT,
    location TEXT,
    FOREIGN KEY (author_id) REFERENCES authors(id)
);

-- Indexes for the feed's sort and filter paths
CREATE INDEX IF NOT EXISTS idx_posts_post_date ON posts(post_date DESC);
CREATE INDEX IF NOT EXISTS idx_posts_category ON posts(category);
CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id);
"#;
