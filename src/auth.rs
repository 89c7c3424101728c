use std::time::SystemTime;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, TokenError};

/// Role
///
/// The closed set of access levels a user can hold. Tokens carry one of these,
/// and every allowed-role set on a route is built from them, so a typo'd role
/// name is a compile error rather than a silently-failing string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    /// Full access, including user and taxonomy administration.
    Admin,
    /// Content authoring: may create and update posts.
    Editor,
    /// Read-only access. The default for newly registered users.
    #[default]
    Viewer,
}

impl Role {
    /// Parses the stored role string. Returns `None` for anything outside the
    /// closed set; callers that read roles from storage use [`Role::from_stored`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Resolves a role string loaded from storage. An unrecognized value demotes
    /// to `Viewer`: a corrupt or legacy role must never grant more access than
    /// the lowest privilege level.
    pub fn from_stored(s: &str) -> Self {
        Self::parse(s).unwrap_or(Role::Viewer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

/// Roles permitted to author and edit posts.
pub const EDITORS: &[Role] = &[Role::Admin, Role::Editor];
/// Roles permitted on administrative routes.
pub const ADMINS: &[Role] = &[Role::Admin];

/// Claims
///
/// The payload structure carried inside a signed bearer token. A `Claims` value
/// exists only between verification and the end of the request that presented
/// it; it is never persisted and never shared across requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user the token was issued to.
    pub sub: Uuid,
    /// The role the user held at issue time.
    pub role: Role,
    /// Issued At (iat): timestamp when the token was created.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

/// TokenCodec
///
/// Creates and verifies signed, time-bounded identity tokens. The codec is
/// constructed once at startup from the configured secret and TTL, cloned into
/// the application state, and read-only thereafter. Test suites construct their
/// own codecs with distinct secrets; there is no process-global key.
///
/// Verification is pure computation: no I/O, no caching, every request checks
/// the signature and expiry from scratch.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    ttl_secs: u64,
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// issue
    ///
    /// Builds a claim set for `subject` with `iat = now` and `exp = now + ttl`,
    /// serializes it, and signs it with the codec secret (HS256).
    pub fn issue(&self, subject: Uuid, role: Role) -> Result<String, ApiError> {
        let now = now_secs();
        let claims = Claims {
            sub: subject,
            role,
            iat: now,
            exp: now + self.ttl_secs as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!("token encoding failed: {:?}", e);
            ApiError::Internal
        })
    }

    /// verify
    ///
    /// Validates the signature over the payload and decodes the claim set.
    /// A token past its expiry is rejected even when the signature is valid;
    /// expiry is checked with zero leeway, so `exp <= now` always fails.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            // Everything else is a token that does not parse into the expected
            // structure: bad base64, bad JSON, missing claims, wrong algorithm.
            _ => TokenError::Malformed,
        })?;

        // jsonwebtoken treats exp == now as still valid; the lifecycle contract
        // here is strict: a token is only acceptable while exp is in the future.
        if token_data.claims.exp <= now_secs() {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the verified subject id
/// and role from the token's claims. `auth_middleware` injects this into the
/// request extensions, scoped to the single in-flight request; downstream
/// stages (the role gate and handlers) read it from there and nowhere else.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. The extractor does not touch
/// the Authorization header itself; it only reads the identity that
/// `auth_middleware` verified and injected. A handler reached without the
/// middleware having run rejects with 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::MissingCredential)
    }
}

/// auth_middleware
///
/// The authentication stage for all protected routes. Per request:
///
/// 1. Extract the bearer token from the `Authorization` header. If it is absent
///    or not in `Bearer <token>` shape, reject with 401; the inner service
///    never runs.
/// 2. Verify it with the [`TokenCodec`]. Any codec error rejects with 401
///    carrying the error kind's message (expired vs malformed vs bad signature)
///    and nothing else: no secret material, no internal detail.
/// 3. Inject the verified [`AuthUser`] into the request extensions and run the
///    next stage.
///
/// The only side effect is that extension insertion, scoped to this request.
pub async fn auth_middleware(
    State(codec): State<TokenCodec>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingCredential)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::MissingCredential)?;

    let claims = codec.verify(token)?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// role_gate
///
/// The authorization stage. `allowed` is bound at route-registration time, not
/// request time; per request this is a pure membership decision over the
/// identity injected by [`auth_middleware`].
///
/// Fails closed in both directions: a missing identity (the gate was wired
/// without the authentication stage) and a role outside the allowed set both
/// reject with 403. There is no implicit admin bypass; `admin` passes only
/// where the set contains it.
pub async fn role_gate(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Forbidden)?;

    if !allowed.contains(&user.role) {
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// hash_password
///
/// One-way adaptive hash of a plaintext secret (argon2id, PHC string output)
/// with a fresh random 16-byte salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| {
        tracing::error!("salt generation failed: {:?}", e);
        ApiError::Internal
    })?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
        tracing::error!("salt encoding failed: {:?}", e);
        ApiError::Internal
    })?;

    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("password hashing failed: {:?}", e);
            ApiError::Internal
        })?
        .to_string();
    Ok(phc)
}

/// verify_password
///
/// Compares a plaintext secret against a stored PHC hash. An unparsable stored
/// hash verifies as false rather than erroring.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}
