use chrono::Utc;
use gorecta::auth::{self, Role};
use gorecta::models::{RegisterRequest, UpdatePostRequest, User, UserResponse};
use uuid::Uuid;

#[test]
fn test_role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
    assert_eq!(serde_json::to_string(&Role::Viewer).unwrap(), "\"viewer\"");

    let role: Role = serde_json::from_str("\"editor\"").unwrap();
    assert_eq!(role, Role::Editor);
    // Anything outside the closed set is a deserialization error, not a role.
    assert!(serde_json::from_str::<Role>("\"root\"").is_err());
}

#[test]
fn test_user_response_never_contains_the_hash() {
    let user = User {
        id: Uuid::new_v4(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: auth::hash_password("secretpw").unwrap(),
        role: "editor".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let response = UserResponse::from(user);
    let json = serde_json::to_string(&response).unwrap();

    assert!(json.contains("alice@example.com"));
    assert!(!json.contains("argon2"), "hash material leaked: {}", json);
    assert!(!json.contains("password"), "hash field leaked: {}", json);
}

#[test]
fn test_user_response_demotes_unknown_roles() {
    let user = User {
        role: "superuser".to_string(),
        ..User::default()
    };
    assert_eq!(UserResponse::from(user).role, Role::Viewer);
}

#[test]
fn test_password_hash_round_trip() {
    let hash = auth::hash_password("correct horse battery staple").unwrap();

    // PHC string, parametrized argon2.
    assert!(hash.starts_with("$argon2"));
    assert!(auth::verify_password(&hash, "correct horse battery staple"));
    assert!(!auth::verify_password(&hash, "wrong password"));
    // Two hashes of the same input differ (random salt).
    let second = auth::hash_password("correct horse battery staple").unwrap();
    assert_ne!(hash, second);
}

#[test]
fn test_register_request_shape() {
    let req: RegisterRequest = serde_json::from_str(
        r#"{ "name": "Alice", "email": "alice@example.com", "password": "pw" }"#,
    )
    .unwrap();
    assert_eq!(req.email, "alice@example.com");
}

#[test]
fn test_partial_update_omits_absent_fields() {
    let req = UpdatePostRequest {
        published: Some(true),
        ..UpdatePostRequest::default()
    };
    let json = serde_json::to_string(&req).unwrap();
    // Only the provided field serializes; absent fields are omitted entirely.
    assert_eq!(json, r#"{"published":true}"#);
}
