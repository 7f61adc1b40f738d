use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::{ApiError, ApiResult},
    db::query::{PageRequest, PostFilter, ALL_CATEGORIES},
    db::repositories::{AuthorRepository, PostRepository},
    state::AppState,
};
use feedline_types::{
    AuthorPatch, CreatePostRequest, FeedStats, MutationResponse, Patch, PostPage, PostPatch,
    SortOption, UpdatePostRequest,
};

#[derive(Debug, Default, Deserialize)]
pub struct GetPostsQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
}

impl GetPostsQuery {
    fn filters(&self) -> Vec<PostFilter> {
        let mut filters = Vec::new();
        if let Some(search) = non_empty(&self.search) {
            filters.push(PostFilter::Search(search));
        }
        if let Some(category) = non_empty(&self.category) {
            // The frontend's "show everything" sentinel is not a filter.
            if category != ALL_CATEGORIES {
                filters.push(PostFilter::Category(category));
            }
        }
        if let Some(date_from) = non_empty(&self.date_from) {
            filters.push(PostFilter::DateFrom(date_from));
        }
        if let Some(date_to) = non_empty(&self.date_to) {
            filters.push(PostFilter::DateTo(date_to));
        }
        if let Some(first_name) = non_empty(&self.first_name) {
            filters.push(PostFilter::FirstName(first_name));
        }
        if let Some(last_name) = non_empty(&self.last_name) {
            filters.push(PostFilter::LastName(last_name));
        }
        filters
    }

    fn sort(&self) -> SortOption {
        match self.sort_by.as_deref() {
            None => SortOption::default(),
            Some(label) => SortOption::parse(label).unwrap_or_else(|| {
                tracing::warn!(
                    "Invalid sort option '{}', using default '{}'",
                    label,
                    SortOption::default().as_str()
                );
                SortOption::default()
            }),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

/// GET /posts - filtered, sorted, paginated feed
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<GetPostsQuery>,
) -> ApiResult<Json<PostPage>> {
    let post_repo = PostRepository::new(state.db.pool.clone());

    let request = PageRequest::new(
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(state.default_per_page),
    );
    let (posts, total) = post_repo.page(&query.filters(), query.sort(), request)?;

    Ok(Json(PostPage {
        posts,
        total,
        page: request.page,
        per_page: request.per_page,
        total_pages: request.total_pages(total),
    }))
}

/// GET /posts/stats - aggregate feed counters
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<FeedStats>> {
    let post_repo = PostRepository::new(state.db.pool.clone());
    Ok(Json(post_repo.stats()?))
}

/// POST /posts - create a post, creating or refreshing its author
pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<MutationResponse>> {
    if payload.email.is_empty() {
        return Err(ApiError::BadRequest("Author email is required".to_string()));
    }

    let author_repo = AuthorRepository::new(state.db.pool.clone());
    let post_repo = PostRepository::new(state.db.pool.clone());

    let author_id = author_repo.get_or_create(
        &payload.email,
        &payload.first_name,
        &payload.last_name,
        payload.company.as_deref(),
        payload.job_title.as_deref(),
    )?;

    let post_id = post_repo.create(
        author_id,
        &payload.text,
        payload.svg_image.as_deref(),
        payload.category.as_deref(),
        payload.tags.as_deref(),
        payload.location.as_deref(),
    )?;

    Ok(Json(MutationResponse {
        id: post_id,
        message: "Post created successfully".to_string(),
    }))
}

/// PUT /posts/:id - partial update of a post and/or its author
pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<MutationResponse>> {
    let author_repo = AuthorRepository::new(state.db.pool.clone());
    let post_repo = PostRepository::new(state.db.pool.clone());

    let Some(author_id) = post_repo.author_id_of(post_id)? else {
        return Err(ApiError::NotFound(format!(
            "Post with ID {post_id} not found"
        )));
    };

    let author_patch = AuthorPatch::from_request(&payload);
    if !author_patch.is_empty() {
        if let Patch::Set(new_email) = &author_patch.email {
            let author = author_repo
                .get_by_id(author_id)?
                .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;
            if !author_repo.email_available(new_email, author_id, &author.email)? {
                return Err(ApiError::BadRequest(
                    "Email already exists for another author".to_string(),
                ));
            }
        }
        author_repo.apply_patch(author_id, &author_patch)?;
    }

    let post_patch = PostPatch::from_request(&payload);
    if !post_patch.is_empty() {
        post_repo.apply_patch(post_id, &post_patch)?;
    }

    Ok(Json(MutationResponse {
        id: post_id,
        message: "Post updated successfully".to_string(),
    }))
}

/// DELETE /posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> ApiResult<Json<MutationResponse>> {
    let post_repo = PostRepository::new(state.db.pool.clone());

    if !post_repo.delete(post_id)? {
        return Err(ApiError::NotFound(format!(
            "Post with ID {post_id} not found"
        )));
    }
    tracing::info!(post_id, "Post deleted");

    Ok(Json(MutationResponse {
        id: post_id,
        message: "Post deleted successfully".to_string(),
    }))
}

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
