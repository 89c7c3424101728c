use crate::auth::Role;
use crate::error::ApiError;
use crate::models::{
    Category, CreateCategoryRequest, CreatePostRequest, CreateTagRequest, Post, Tag,
    UpdateCategoryRequest, UpdatePostRequest, UpdateTagRequest, User,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers and the auth core to interact with the data layer without knowing
/// the concrete implementation (Postgres, in-memory mock, etc.).
///
/// The auth core uses exactly two of these operations: `find_user_by_email`
/// during login and `create_user` during registration. Uniqueness of the login
/// identifier is enforced by the storage layer's unique index; a concurrent
/// duplicate insert surfaces as `DuplicateIdentifier`, never as a race this
/// trait's callers must resolve.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across the runtime's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Credentials ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    /// Persists a new credential record. Fails with `DuplicateIdentifier` when
    /// the email is already registered.
    async fn create_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
        role: Role,
    ) -> Result<User, ApiError>;
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    /// Partial update via COALESCE; `None` fields keep their stored value.
    async fn update_user(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
        role: Option<Role>,
    ) -> Result<Option<User>, ApiError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Posts ---
    async fn get_posts(
        &self,
        published: Option<bool>,
        category_id: Option<Uuid>,
    ) -> Result<Vec<Post>, ApiError>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, ApiError>;
    async fn create_post(&self, req: CreatePostRequest, user_id: Uuid) -> Result<Post, ApiError>;
    async fn update_post(&self, id: Uuid, req: UpdatePostRequest)
    -> Result<Option<Post>, ApiError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Categories ---
    async fn get_categories(&self) -> Result<Vec<Category>, ApiError>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, ApiError>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, ApiError>;
    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, ApiError>;
    async fn delete_category(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Tags ---
    async fn get_tags(&self) -> Result<Vec<Tag>, ApiError>;
    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, ApiError>;
    async fn create_tag(&self, req: CreateTagRequest) -> Result<Tag, ApiError>;
    async fn update_tag(&self, id: Uuid, req: UpdateTagRequest) -> Result<Option<Tag>, ApiError>;
    async fn delete_tag(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the tag sets for the given posts in a single join query and
    /// attaches them in place.
    async fn attach_tags(&self, posts: &mut [Post]) -> Result<(), ApiError> {
        if posts.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let links = sqlx::query_as::<_, TagLinkRow>(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug, t.created_at, t.updated_at
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.slug ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for link in links {
            by_post.entry(link.post_id).or_default().push(Tag {
                id: link.id,
                name: link.name,
                slug: link.slug,
                created_at: link.created_at,
                updated_at: link.updated_at,
            });
        }
        for post in posts.iter_mut() {
            post.tags = by_post.remove(&post.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Replaces a post's tag links with the given set.
    async fn replace_post_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(post_id)
                .bind(tag_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

/// Row shape for the post/tag join in `attach_tags`.
#[derive(sqlx::FromRow)]
struct TagLinkRow {
    post_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// Maps a unique-index violation to the conflict variant; everything else is a
/// logged internal failure.
fn map_insert_error(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return ApiError::DuplicateIdentifier;
        }
    }
    e.into()
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";
const POST_COLUMNS: &str =
    "id, user_id, category_id, title, content, slug, published, featured_img, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at, updated_at";
const TAG_COLUMNS: &str = "id, name, slug, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// find_user_by_email
    ///
    /// The credential lookup used by login. Reads the record by its unique
    /// login identifier; the core never mutates it.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Inserts a new credential record. The unique index on `email` is the
    /// single source of truth for duplicate detection: a concurrent insert of
    /// the same identifier loses cleanly with `DuplicateIdentifier`.
    async fn create_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
        role: Role,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// update_user
    ///
    /// Uses the PostgreSQL `COALESCE` function to handle `Option<T>` fields,
    /// only updating a column when the corresponding argument is `Some`.
    async fn update_user(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
        role: Option<Role>,
    ) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.map(|r| r.as_str().to_string()))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// get_posts
    ///
    /// Lists posts with optional publication-state and category filters, tag
    /// sets attached.
    async fn get_posts(
        &self,
        published: Option<bool>,
        category_id: Option<Uuid>,
    ) -> Result<Vec<Post>, ApiError> {
        let mut posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM posts
            WHERE ($1::bool IS NULL OR published = $1)
              AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(published)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_tags(&mut posts).await?;
        Ok(posts)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, ApiError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match post {
            Some(mut post) => {
                let slot = std::slice::from_mut(&mut post);
                self.attach_tags(slot).await?;
                Ok(Some(post))
            }
            None => Ok(None),
        }
    }

    /// create_post
    ///
    /// Inserts the post row, then writes its tag links. Slug collisions map to
    /// the conflict variant via the unique index.
    async fn create_post(&self, req: CreatePostRequest, user_id: Uuid) -> Result<Post, ApiError> {
        let mut post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, user_id, category_id, title, content, slug, published, featured_img, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(req.category_id)
        .bind(req.title)
        .bind(req.content)
        .bind(req.slug)
        .bind(req.published)
        .bind(req.featured_img)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        self.replace_post_tags(post.id, &req.tag_ids).await?;
        let slot = std::slice::from_mut(&mut post);
        self.attach_tags(slot).await?;
        Ok(post)
    }

    /// update_post
    ///
    /// COALESCE partial update; a present `tag_ids` replaces the tag set.
    async fn update_post(
        &self,
        id: Uuid,
        req: UpdatePostRequest,
    ) -> Result<Option<Post>, ApiError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                slug = COALESCE($4, slug),
                category_id = COALESCE($5, category_id),
                featured_img = COALESCE($6, featured_img),
                published = COALESCE($7, published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.content)
        .bind(req.slug)
        .bind(req.category_id)
        .bind(req.featured_img)
        .bind(req.published)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_insert_error)?;

        match post {
            Some(mut post) => {
                if let Some(tag_ids) = &req.tag_ids {
                    self.replace_post_tags(post.id, tag_ids).await?;
                }
                let slot = std::slice::from_mut(&mut post);
                self.attach_tags(slot).await?;
                Ok(Some(post))
            }
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, ApiError> {
        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, ApiError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, ApiError> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (id, name, slug, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(req.name)
        .bind(req.slug)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, ApiError> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.slug)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let tags = sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>, ApiError> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tag)
    }

    async fn create_tag(&self, req: CreateTagRequest) -> Result<Tag, ApiError> {
        sqlx::query_as::<_, Tag>(&format!(
            r#"
            INSERT INTO tags (id, name, slug, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING {TAG_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(req.name)
        .bind(req.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn update_tag(&self, id: Uuid, req: UpdateTagRequest) -> Result<Option<Tag>, ApiError> {
        sqlx::query_as::<_, Tag>(&format!(
            r#"
            UPDATE tags
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TAG_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name)
        .bind(req.slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn delete_tag(&self, id: Uuid) -> Result<bool, ApiError> {
        sqlx::query("DELETE FROM post_tags WHERE tag_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
