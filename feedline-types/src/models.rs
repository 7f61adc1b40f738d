use serde::{Deserialize, Serialize};

use crate::patch::Patch;

/// A stored author row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub bio: String,
    pub follower_count: i64,
    pub verified: bool,
}

/// Author fields as embedded in a post payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub bio: String,
    pub follower_count: i64,
    pub verified: bool,
}

/// A post joined with its author, as served by the feed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
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
    pub author: AuthorInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub svg_image: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Partial update payload. Every field is optional; see [`Patch`] for how
/// absent and empty values are told apart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub svg_image: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Author columns touched by a partial update.
#[derive(Debug, Clone, Default)]
pub struct AuthorPatch {
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub email: Patch<String>,
    pub company: Patch<String>,
    pub job_title: Patch<String>,
}

impl AuthorPatch {
    pub fn from_request(request: &UpdatePostRequest) -> Self {
        Self {
            first_name: Patch::required(request.first_name.clone()),
            last_name: Patch::required(request.last_name.clone()),
            email: Patch::required(request.email.clone()),
            company: Patch::nullable(request.company.clone()),
            job_title: Patch::nullable(request.job_title.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_keep()
            && self.last_name.is_keep()
            && self.email.is_keep()
            && self.company.is_keep()
            && self.job_title.is_keep()
    }
}

/// Post columns touched by a partial update.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub text: Patch<String>,
    pub category: Patch<String>,
    pub svg_image: Patch<String>,
    pub tags: Patch<String>,
    pub location: Patch<String>,
}

impl PostPatch {
    pub fn from_request(request: &UpdatePostRequest) -> Self {
        Self {
            text: Patch::required(request.text.clone()),
            category: Patch::nullable(request.category.clone()),
            svg_image: Patch::nullable(request.svg_image.clone()),
            tags: Patch::nullable(request.tags.clone()),
            location: Patch::nullable(request.location.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_keep()
            && self.category.is_keep()
            && self.svg_image.is_keep()
            && self.tags.is_keep()
            && self.location.is_keep()
    }
}

/// One page of the post feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Aggregate counters over the whole feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedStats {
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub avg_engagement_rate: f64,
}

/// Response body for create/update/delete mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
