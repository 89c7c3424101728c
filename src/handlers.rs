use crate::{
    AppState,
    auth::{self, AuthUser, Role},
    error::ApiError,
    models::{
        Category, CreateCategoryRequest, CreatePostRequest, CreateTagRequest, LoginRequest, Post,
        PostFilter, RegisterRequest, Tag, TokenResponse, UpdateCategoryRequest, UpdatePostRequest,
        UpdateTagRequest, UpdateUserRequest, UserResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// A syntactically valid argon2id PHC string that matches no password. Login
/// verifies against this when the identifier is unknown, so the unknown-user
/// and wrong-password paths do comparable work before returning the identical
/// error.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates a new account. The plaintext secret is hashed with
/// argon2 before anything is persisted; the stored record starts at the lowest
/// privilege role. Registration issues no token; logging in is a separate
/// operation.
///
/// The pre-check against the existing identifier gives the common case a clean
/// 409; the unique index on `users.email` enforces the same outcome under
/// concurrent registration.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Identifier already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    if state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateIdentifier);
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .repo
        .create_user(payload.name, payload.email, password_hash, Role::Viewer)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// login
///
/// [Public Route] Verifies the submitted credentials and returns a fresh
/// signed bearer token carrying the record's id and role.
///
/// A nonexistent identifier and a wrong password return the same
/// `invalid credentials` error with the same status, and the missing-record
/// path still runs a hash verification, so the response gives a caller no
/// signal about which identifiers exist.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    match state.repo.find_user_by_email(&payload.email).await? {
        Some(user) if auth::verify_password(&user.password_hash, &payload.password) => {
            let role = Role::from_stored(&user.role);
            let token = state.tokens.issue(user.id, role)?;
            Ok(Json(TokenResponse { token }))
        }
        Some(_) => Err(ApiError::InvalidCredentials),
        None => {
            let _ = auth::verify_password(DUMMY_HASH, &payload.password);
            Err(ApiError::InvalidCredentials)
        }
    }
}

// --- Post Handlers ---

/// get_posts
///
/// [Authenticated Route] Lists posts with optional publication and category
/// filters, tag sets included.
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(PostFilter),
    responses((status = 200, description = "Posts", body = [Post]))
)]
pub async fn get_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state
        .repo
        .get_posts(filter.published, filter.category_id)
        .await?;
    Ok(Json(posts))
}

/// get_post
///
/// [Authenticated Route] Retrieves a single post by id, tags included.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    match state.repo.get_post(id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound),
    }
}

/// create_post
///
/// [Editorial Route] Submits a new post. The author id is taken from the
/// verified identity, never from the payload.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 409, description = "Slug already exists")
    )
)]
pub async fn create_post(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.repo.create_post(payload, user_id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Editorial Route] Applies a partial update to a post; a present `tag_ids`
/// replaces the tag set.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    match state.repo.update_post(id, payload).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_post
///
/// [Admin Route] Removes a post and its tag links.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_post(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Category Handlers ---

/// get_categories
///
/// [Authenticated Route] Lists all categories.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn get_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.get_categories().await?))
}

/// get_category
///
/// [Authenticated Route] Retrieves a single category by id.
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    match state.repo.get_category(id).await? {
        Some(category) => Ok(Json(category)),
        None => Err(ApiError::NotFound),
    }
}

/// create_category
///
/// [Admin Route] Creates a new category.
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 409, description = "Slug already exists")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.repo.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Applies a partial update to a category.
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    match state.repo.update_category(id, payload).await? {
        Some(category) => Ok(Json(category)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_category
///
/// [Admin Route] Removes a category.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_category(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Tag Handlers ---

/// get_tags
///
/// [Authenticated Route] Lists all tags.
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    responses((status = 200, description = "Tags", body = [Tag]))
)]
pub async fn get_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.repo.get_tags().await?))
}

/// get_tag
///
/// [Authenticated Route] Retrieves a single tag by id.
#[utoipa::path(
    get,
    path = "/api/v1/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Found", body = Tag),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tag>, ApiError> {
    match state.repo.get_tag(id).await? {
        Some(tag) => Ok(Json(tag)),
        None => Err(ApiError::NotFound),
    }
}

/// create_tag
///
/// [Admin Route] Creates a new tag.
#[utoipa::path(
    post,
    path = "/api/v1/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Created", body = Tag),
        (status = 409, description = "Slug already exists")
    )
)]
pub async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.repo.create_tag(payload).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// update_tag
///
/// [Admin Route] Applies a partial update to a tag.
#[utoipa::path(
    put,
    path = "/api/v1/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Updated", body = Tag),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    match state.repo.update_tag(id, payload).await? {
        Some(tag) => Ok(Json(tag)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_tag
///
/// [Admin Route] Removes a tag and its post links.
#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_tag(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- User Handlers ---

/// get_users
///
/// [Admin Route] Lists all accounts as their public projections.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses((status = 200, description = "Users", body = [UserResponse]))
)]
pub async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.repo.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// get_user
///
/// [Authenticated Route] Retrieves a single account's public projection.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    match state.repo.get_user(id).await? {
        Some(user) => Ok(Json(user.into())),
        None => Err(ApiError::NotFound),
    }
}

/// update_user
///
/// [Authenticated Route] Updates an account. Two-tier authorization: a user may
/// update their own record, an admin may update any record, and a `role` change
/// is accepted from admins only. A supplied password is re-hashed before it
/// reaches the repository.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 403, description = "Not yours"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if auth_user.id != id && auth_user.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    if payload.role.is_some() && auth_user.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let password_hash = match payload.password.as_deref() {
        Some(pw) if !pw.is_empty() => Some(auth::hash_password(pw)?),
        Some(_) => {
            return Err(ApiError::Validation("password must not be empty".to_string()));
        }
        None => None,
    };

    match state
        .repo
        .update_user(id, payload.name, payload.email, password_hash, payload.role)
        .await?
    {
        Some(user) => Ok(Json(user.into())),
        None => Err(ApiError::NotFound),
    }
}

/// delete_user
///
/// [Admin Route] Removes an account.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
