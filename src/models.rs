use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record from the `users` table. This is the internal
/// representation: it carries the password hash and is therefore never
/// serialized to a response. Handlers convert it to [`UserResponse`] first.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// The unique login identifier.
    pub email: String,
    /// PHC-format argon2 hash. Read only during login; never leaves the process.
    pub password_hash: String,
    /// Stored as text; resolved to a typed [`Role`] at claim-build time.
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// UserResponse
///
/// The public projection of a user record, used by every endpoint that returns
/// account data. Structurally incapable of leaking the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: Role::from_stored(&user.role),
            created_at: user.created_at,
        }
    }
}

/// Post
///
/// A blog post record from the `posts` table. `tags` is not a row column; the
/// repository loads it from the `post_tags` join table where the endpoint calls
/// for it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    // FK to users.id (the author).
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    // URL identifier, unique across posts.
    pub slug: String,
    pub published: bool,
    pub featured_img: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    /// Loaded via the `post_tags` join, not from the posts row.
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Category
///
/// A content category from the `categories` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Tag
///
/// A content tag from the `tags` table, attached to posts via `post_tags`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for POST /auth/register. The plaintext password is hashed
/// immediately and never persisted or logged. Registered accounts always start
/// at the lowest privilege level; there is no role field to supply.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// TokenResponse
///
/// Output of a successful login: the signed bearer token. The server keeps no
/// record of it: validity is entirely signature + expiry.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

/// CreatePostRequest
///
/// Input payload for submitting a new post (POST /posts).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    pub featured_img: Option<String>,
    #[serde(default)]
    pub published: bool,
}

/// UpdatePostRequest
///
/// Partial update payload for PUT /posts/{id}. Only fields present in the JSON
/// are applied; `tag_ids`, when present, replaces the post's tag set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<Uuid>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_img: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// CreateCategoryRequest
///
/// Input payload for POST /categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// UpdateCategoryRequest
///
/// Partial update payload for PUT /categories/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CreateTagRequest
///
/// Input payload for POST /tags.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTagRequest {
    pub name: String,
    pub slug: String,
}

/// UpdateTagRequest
///
/// Partial update payload for PUT /tags/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTagRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// UpdateUserRequest
///
/// Partial update payload for PUT /users/{id}. A `role` change is an
/// administrative action; the handler rejects it from non-admin callers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// PostFilter
///
/// Accepted query parameters for the post listing endpoint (GET /posts).
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct PostFilter {
    /// Optional filter on publication state.
    pub published: Option<bool>,
    /// Optional filter on the owning category.
    pub category_id: Option<Uuid>,
}
