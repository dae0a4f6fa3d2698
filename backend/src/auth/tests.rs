use super::*;
use axum::http::Request;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";

fn claims(aud: &str, exp: usize) -> SupabaseClaims {
    SupabaseClaims {
        sub: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        role: "authenticated".to_string(),
        email: Some("test@example.com".to_string()),
        aud: Some(aud.to_string()),
        exp,
    }
}

fn sign(claims: &SupabaseClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn parts(headers: &[(&str, &str)], with_secret: bool) -> Parts {
    let mut builder = Request::builder().uri("/api/v1/plan");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (mut parts, _) = builder.body(()).unwrap().into_parts();
    if with_secret {
        parts.extensions.insert(SupabaseJwtSecret::new(SECRET));
    }
    parts
}

#[test]
fn test_validate_supabase_jwt_success() {
    let my_claims = claims("authenticated", 9999999999);
    let token = sign(&my_claims, SECRET);

    let claims = validate_supabase_jwt(&token, SECRET).expect("Valid token should pass");
    assert_eq!(claims.sub, my_claims.sub);
    assert_eq!(claims.email, my_claims.email);
}

#[test]
fn test_validate_supabase_jwt_expired() {
    let token = sign(&claims("authenticated", 1), SECRET);
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_invalid_signature() {
    let token = sign(&claims("authenticated", 9999999999), "wrongsecret");
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_rejects_other_audiences() {
    let token = sign(&claims("anon", 9999999999), SECRET);
    assert!(validate_supabase_jwt(&token, SECRET).is_err());
}

#[tokio::test]
async fn extractor_reads_bearer_token() {
    let token = sign(&claims("authenticated", 9999999999), SECRET);
    let header = format!("Bearer {token}");
    let mut parts = parts(&[("authorization", header.as_str())], true);

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(
        user.user_id,
        Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap()
    );
    assert_eq!(user.role, "authenticated");
}

#[tokio::test]
async fn extractor_rejects_missing_header() {
    let mut parts = parts(&[], true);
    let (status, _) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn extractor_without_secret_is_a_server_error() {
    let token = sign(&claims("authenticated", 9999999999), SECRET);
    let header = format!("Bearer {token}");
    let mut parts = parts(&[("authorization", header.as_str())], false);
    let (status, _) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn attendee_id_must_be_a_uuid() {
    let mut ok = parts(&[("x-attendee-id", "6f1c1f1e-8c1a-4d3e-9a57-0d8f2b5c6e71")], false);
    assert!(AttendeeId::from_request_parts(&mut ok, &()).await.is_ok());

    let mut bad = parts(&[("x-attendee-id", "browser-42")], false);
    let (status, _) = AttendeeId::from_request_parts(&mut bad, &()).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut missing = parts(&[], false);
    assert!(AttendeeId::from_request_parts(&mut missing, &()).await.is_err());
}
