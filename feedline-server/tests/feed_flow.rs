//! End-to-end tests over the import pipeline and the post API handlers,
//! running against an in-memory database.

use std::path::PathBuf;

use axum::extract::{Path, Query, State};
use axum::Json;

use feedline_server::api::posts::{
    create_post, delete_post, get_posts, get_stats, update_post, GetPostsQuery,
};
use feedline_server::api::ApiError;
use feedline_server::db::repositories::{AuthorRepository, PostRepository};
use feedline_server::db::Database;
use feedline_server::import::import_csv;
use feedline_server::state::AppState;
use feedline_types::{CreatePostRequest, UpdatePostRequest};

const CSV_HEADER: &str = "post_id,author_first_name,author_last_name,author_email,author_company,author_job_title,author_bio,author_follower_count,author_verified,post_text,post_date,likes,comments,shares,total_engagements,engagement_rate,post_image_svg,post_category,post_tags,location";

fn test_state() -> AppState {
    let db = Database::in_memory().expect("Failed to create database");
    db.initialize().expect("Failed to initialize schema");
    AppState::new(db, 20)
}

fn write_csv(name: &str, rows: &[&str]) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    let mut content = String::from(CSV_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    std::fs::write(&path, content).expect("write test csv");
    path
}

fn create_request(email: &str, text: &str) -> CreatePostRequest {
    CreatePostRequest {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: email.to_string(),
        company: None,
        job_title: None,
        text: text.to_string(),
        category: Some("Product".to_string()),
        svg_image: None,
        tags: None,
        location: None,
    }
}

#[test]
fn import_three_rows_two_emails() {
    let state = test_state();
    let path = write_csv(
        "feedline_import_basic.csv",
        &[
            "1,Jane,Doe,jane@example.com,Acme,CTO,Builder,100,true,first post,2024-01-01 10:00:00,10,1,0,11,2.5,,Product,,",
            "2,Jane,Doe,jane@example.com,Acme,CTO,Builder,100,true,second post,2024-01-02 10:00:00,20,2,0,22,3.0,,Product,,",
            "3,John,Smith,john@example.com,,,Writer,50,false,third post,2024-01-03 10:00:00,30,3,0,33,3.5,,News,,",
        ],
    );

    let summary = import_csv(&state.db, &path).expect("import");
    assert_eq!(summary.authors_inserted, 2);
    assert_eq!(summary.posts_inserted, 3);
    assert_eq!(summary.missing_author, 0);
    assert_eq!(summary.invalid_id, 0);

    let posts = PostRepository::new(state.db.pool.clone());
    let stats = posts.stats().expect("stats");
    assert_eq!(stats.total_posts, 3);
    assert_eq!(stats.total_likes, 60);
    assert_eq!(stats.total_comments, 6);
    assert_eq!(stats.avg_engagement_rate, 3.0);

    let _ = std::fs::remove_file(path);
}

#[test]
fn reimport_is_idempotent_for_authors_and_replaces_posts() {
    let state = test_state();
    let first = write_csv(
        "feedline_import_idem_1.csv",
        &[
            "1,Jane,Doe,jane@example.com,Acme,CTO,Builder,100,true,original text,2024-01-01 10:00:00,10,1,0,11,2.5,,Product,,",
        ],
    );
    let second = write_csv(
        "feedline_import_idem_2.csv",
        &[
            "1,Janet,Doe,jane@example.com,Globex,CEO,Renamed,200,false,replaced text,2024-01-01 10:00:00,99,9,0,108,4.0,,News,,",
        ],
    );

    import_csv(&state.db, &first).expect("first import");
    import_csv(&state.db, &second).expect("second import");

    let authors = AuthorRepository::new(state.db.pool.clone());
    let map = authors.email_id_map().expect("email map");
    assert_eq!(map.len(), 1, "one author per email after re-import");

    let stored = authors
        .get_by_email("jane@example.com")
        .unwrap()
        .expect("author exists");
    assert_eq!(stored.first_name, "Jane", "authors are never overwritten by import");

    let posts = PostRepository::new(state.db.pool.clone());
    let post = posts.get_with_author(1).unwrap().expect("post exists");
    assert_eq!(post.text, "replaced text", "posts are replaced by id");
    assert_eq!(post.likes, 99);

    let _ = std::fs::remove_file(first);
    let _ = std::fs::remove_file(second);
}

#[test]
fn import_skips_rows_without_resolvable_author_or_id() {
    let state = test_state();
    let path = write_csv(
        "feedline_import_skips.csv",
        &[
            "1,Jane,Doe,jane@example.com,,,,,true,kept,2024-01-01 10:00:00,1,0,0,1,1.0,,,,",
            "oops,Jane,Doe,jane@example.com,,,,,true,bad id,2024-01-01 10:00:00,1,0,0,1,1.0,,,,",
            "3,Ghost,Writer,,,,,,false,no email,2024-01-01 10:00:00,1,0,0,1,1.0,,,,",
        ],
    );

    let summary = import_csv(&state.db, &path).expect("import");
    assert_eq!(summary.authors_inserted, 1);
    assert_eq!(summary.posts_inserted, 1);
    assert_eq!(summary.invalid_id, 1);
    assert_eq!(summary.skipped_rows, 1, "row without email is counted");
    assert_eq!(summary.missing_author, 1, "its post cannot resolve an author");

    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_csv_file_is_a_noop() {
    let state = test_state();
    let path = std::env::temp_dir().join("feedline_does_not_exist.csv");
    let summary = import_csv(&state.db, &path).expect("no-op import");
    assert_eq!(summary.posts_inserted, 0);
    assert_eq!(summary.authors_inserted, 0);
}

#[tokio::test]
async fn create_then_list_round_trips() {
    let state = test_state();

    let Json(created) = create_post(
        State(state.clone()),
        Json(create_request("jane@example.com", "hello feed")),
    )
    .await
    .expect("create post");
    assert_eq!(created.id, 1);

    let Json(page) = get_posts(State(state.clone()), Query(GetPostsQuery::default()))
        .await
        .expect("list posts");
    assert_eq!(page.total, 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.posts[0].text, "hello feed");
    assert_eq!(page.posts[0].likes, 0);
    assert_eq!(page.posts[0].engagement_rate, 0.0);
    assert_eq!(page.posts[0].author.email, "jane@example.com");
    assert!(page.posts[0].author.verified);
}

#[tokio::test]
async fn most_liked_sort_returns_top_two() {
    let state = test_state();
    let path = write_csv(
        "feedline_sort_test.csv",
        &[
            "1,Jane,Doe,jane@example.com,,,,,true,a,2024-01-01 10:00:00,10,0,0,10,1.0,,,,",
            "2,Jane,Doe,jane@example.com,,,,,true,b,2024-01-02 10:00:00,50,0,0,50,1.0,,,,",
            "3,Jane,Doe,jane@example.com,,,,,true,c,2024-01-03 10:00:00,5,0,0,5,1.0,,,,",
            "4,Jane,Doe,jane@example.com,,,,,true,d,2024-01-04 10:00:00,20,0,0,20,1.0,,,,",
            "5,Jane,Doe,jane@example.com,,,,,true,e,2024-01-05 10:00:00,1,0,0,1,1.0,,,,",
        ],
    );
    import_csv(&state.db, &path).expect("import");

    let query = GetPostsQuery {
        sort_by: Some("Most Liked".to_string()),
        per_page: Some(2),
        page: Some(1),
        ..Default::default()
    };
    let Json(page) = get_posts(State(state.clone()), Query(query))
        .await
        .expect("list posts");

    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    let likes: Vec<i64> = page.posts.iter().map(|p| p.likes).collect();
    assert_eq!(likes, vec![50, 20]);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn update_distinguishes_clear_from_absent() {
    let state = test_state();
    create_post(
        State(state.clone()),
        Json(create_request("jane@example.com", "hello")),
    )
    .await
    .expect("create post");

    // No category field at all: value stays.
    update_post(
        State(state.clone()),
        Path(1),
        Json(UpdatePostRequest {
            text: Some("edited".to_string()),
            ..Default::default()
        }),
    )
    .await
    .expect("update text");

    let posts = PostRepository::new(state.db.pool.clone());
    let post = posts.get_with_author(1).unwrap().unwrap();
    assert_eq!(post.text, "edited");
    assert_eq!(post.category.as_deref(), Some("Product"));

    // Explicit empty string: value clears to NULL.
    update_post(
        State(state.clone()),
        Path(1),
        Json(UpdatePostRequest {
            category: Some(String::new()),
            ..Default::default()
        }),
    )
    .await
    .expect("clear category");

    let post = posts.get_with_author(1).unwrap().unwrap();
    assert_eq!(post.category, None);
    assert_eq!(post.text, "edited");
}

#[tokio::test]
async fn update_rejects_email_collision() {
    let state = test_state();
    create_post(
        State(state.clone()),
        Json(create_request("a@example.com", "by a")),
    )
    .await
    .expect("create first post");
    create_post(
        State(state.clone()),
        Json(create_request("b@example.com", "by b")),
    )
    .await
    .expect("create second post");

    let result = update_post(
        State(state.clone()),
        Path(1),
        Json(UpdatePostRequest {
            email: Some("b@example.com".to_string()),
            ..Default::default()
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));

    let authors = AuthorRepository::new(state.db.pool.clone());
    let author = authors.get_by_email("a@example.com").unwrap();
    assert!(author.is_some(), "rejected update leaves the email unchanged");
}

#[tokio::test]
async fn missing_posts_return_not_found() {
    let state = test_state();

    let result = update_post(
        State(state.clone()),
        Path(42),
        Json(UpdatePostRequest::default()),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let result = delete_post(State(state.clone()), Path(42)).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn delete_then_stats_reflects_removal() {
    let state = test_state();
    create_post(
        State(state.clone()),
        Json(create_request("jane@example.com", "ephemeral")),
    )
    .await
    .expect("create post");

    let Json(response) = delete_post(State(state.clone()), Path(1))
        .await
        .expect("delete post");
    assert_eq!(response.id, 1);

    let Json(stats) = get_stats(State(state.clone())).await.expect("stats");
    assert_eq!(stats.total_posts, 0);
    assert_eq!(stats.avg_engagement_rate, 0.0);
}
