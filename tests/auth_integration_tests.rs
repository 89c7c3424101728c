use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, request::Parts},
};
use gorecta::auth::{AuthUser, Role, TokenCodec};
use gorecta::error::{ApiError, TokenError};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn codec(ttl_secs: u64) -> TokenCodec {
    TokenCodec::new(TEST_JWT_SECRET, ttl_secs)
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- Token Codec Tests ---

#[test]
fn test_issue_verify_round_trip() {
    let codec = codec(3600);

    let token = codec.issue(TEST_USER_ID, Role::Editor).expect("issue failed");
    let claims = codec.verify(&token).expect("verify failed");

    assert_eq!(claims.sub, TEST_USER_ID);
    assert_eq!(claims.role, Role::Editor);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_tampered_payload_fails_with_invalid_signature() {
    let codec = codec(3600);
    let token = codec.issue(TEST_USER_ID, Role::Viewer).unwrap();

    // Flip one character in the middle of the payload segment. The result is
    // still well-formed base64url, so the failure must come from the signature
    // check, not the parser.
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "expected a three-segment token");

    let mut payload: Vec<char> = parts[1].chars().collect();
    let mid = payload.len() / 2;
    payload[mid] = if payload[mid] == 'A' { 'B' } else { 'A' };
    let tampered = format!(
        "{}.{}.{}",
        parts[0],
        payload.iter().collect::<String>(),
        parts[2]
    );

    assert_eq!(
        codec.verify(&tampered).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn test_foreign_secret_fails_with_invalid_signature() {
    let issuing = codec(3600);
    let verifying = TokenCodec::new("a-completely-different-secret", 3600);

    let token = issuing.issue(TEST_USER_ID, Role::Admin).unwrap();

    assert_eq!(
        verifying.verify(&token).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn test_zero_ttl_token_is_expired() {
    // The signature on this token is valid; only the expiry is unacceptable.
    let codec = codec(0);
    let token = codec.issue(TEST_USER_ID, Role::Admin).unwrap();

    assert_eq!(codec.verify(&token).unwrap_err(), TokenError::Expired);
}

#[test]
fn test_garbage_token_is_malformed() {
    let codec = codec(3600);

    assert_eq!(
        codec.verify("not-a-token").unwrap_err(),
        TokenError::Malformed
    );
    assert_eq!(codec.verify("").unwrap_err(), TokenError::Malformed);
}

#[test]
fn test_truncated_token_is_rejected() {
    let codec = codec(3600);
    let token = codec.issue(TEST_USER_ID, Role::Viewer).unwrap();

    // Drop the signature segment entirely.
    let truncated: String = token.rsplit_once('.').map(|(head, _)| head.to_string()).unwrap();
    assert!(codec.verify(&truncated).is_err());
}

// --- AuthUser Extractor Tests ---

#[tokio::test]
async fn test_extractor_without_injected_identity_rejects() {
    // A handler argument resolved without auth_middleware having run must be
    // rejected, not defaulted.
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let result = AuthUser::from_request_parts(&mut parts, &()).await;
    assert!(matches!(result, Err(ApiError::MissingCredential)));
}

#[tokio::test]
async fn test_extractor_reads_injected_identity() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.extensions.insert(AuthUser {
        id: TEST_USER_ID,
        role: Role::Admin,
    });

    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .expect("extractor should read the injected identity");
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, Role::Admin);
}

// --- Role Resolution Tests ---

#[test]
fn test_unknown_stored_role_demotes_to_viewer() {
    assert_eq!(Role::from_stored("admin"), Role::Admin);
    assert_eq!(Role::from_stored("editor"), Role::Editor);
    assert_eq!(Role::from_stored("viewer"), Role::Viewer);
    // A corrupt or legacy value must never resolve upward.
    assert_eq!(Role::from_stored("superuser"), Role::Viewer);
    assert_eq!(Role::from_stored(""), Role::Viewer);
}
