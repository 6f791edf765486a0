use uuid::Uuid;

use shared_models::auth::ActorRole;
use shared_utils::jwt::{issue_token, validate_token};
use shared_utils::password::PasswordService;

#[test]
fn issued_token_round_trips() {
    let user_id = Uuid::new_v4();
    let token = issue_token(user_id, ActorRole::Pharmacist, "test-secret").unwrap();

    let user = validate_token(&token, "test-secret").unwrap();
    assert_eq!(user.id, user_id);
    assert_eq!(user.role, ActorRole::Pharmacist);
    assert!(user.role.can_handle_appointments());
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let token = issue_token(Uuid::new_v4(), ActorRole::Patient, "secret-a").unwrap();
    assert!(validate_token(&token, "secret-b").is_err());
}

#[test]
fn malformed_token_is_rejected() {
    assert!(validate_token("not-a-token", "test-secret").is_err());
    assert!(validate_token("a.b", "test-secret").is_err());
}

#[test]
fn empty_secret_refuses_to_issue_or_validate() {
    assert!(issue_token(Uuid::new_v4(), ActorRole::Patient, "").is_err());
    assert!(validate_token("a.b.c", "").is_err());
}

#[test]
fn password_hash_verifies_and_rejects() {
    let hash = PasswordService::hash_password("s3cret-pass").unwrap();
    assert!(PasswordService::verify_password("s3cret-pass", &hash).unwrap());
    assert!(!PasswordService::verify_password("wrong-pass", &hash).unwrap());
}
