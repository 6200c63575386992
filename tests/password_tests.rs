use chrono::Duration;
use more_asserts::assert_gt;
use gatekeeper::{AccountStore, AuthResponse, UserType};
use gatekeeper::utils::errors::{ErrorCode, GatekeeperError};
use crate::common::{EMAIL, GOOD, start, test_context};
mod common;

#[tokio::test]
async fn test_a_new_standard_account_must_change_its_password_on_first_login() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let view = ctx.service.create_account(" Jo@Example.com ", "Initial1!", UserType::Standard).await?;

    assert!(view.account_id.starts_with("U-"));
    assert_eq!(view.email, EMAIL);
    assert_eq!(view.password_expiration_date, start());

    match ctx.service.authenticate(EMAIL, "Initial1!").await? {
        AuthResponse::Authenticated(principal) => {
            assert_eq!(principal.user_type, UserType::Standard);
            assert!(principal.must_change_password);
        },
        other => panic!("Expected to authenticate, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_a_new_superuser_has_a_grace_period() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let view = ctx.service.create_account("root@example.com", "Initial1!", UserType::Superuser).await?;
    assert_eq!(view.password_expiration_date, start() + Duration::days(90));

    ctx.service.advance(Duration::days(89));
    match ctx.service.authenticate("root@example.com", "Initial1!").await? {
        AuthResponse::Authenticated(principal) => assert!(!principal.must_change_password),
        other => panic!("Expected to authenticate, got {:?}", other),
    }

    ctx.service.advance(Duration::days(1));
    match ctx.service.authenticate("root@example.com", "Initial1!").await? {
        AuthResponse::Authenticated(principal) => assert!(principal.must_change_password),
        other => panic!("Expected to authenticate, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_emails_are_unique() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    ctx.service.create_account(EMAIL, "Initial1!", UserType::Standard).await?;

    let error = ctx.service.create_account("JO@example.com", "Initial1!", UserType::Superuser).await.unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::DuplicateAccount);
    assert_eq!(ctx.store.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_weak_passwords_are_refused_at_creation() {
    let ctx = test_context();

    let error = ctx.service.create_account(EMAIL, "password", UserType::Standard).await.unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::WeakSecret);

    let error = ctx.service.create_account(EMAIL, "Pass word1!", UserType::Standard).await.unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::InvalidSecret);

    assert!(ctx.store.is_empty());
}

#[tokio::test]
async fn test_a_weak_change_leaves_the_account_untouched() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;
    let before = ctx.store.load(&account_id).await?;

    let error = ctx.service.change_password(&account_id, "short").await.unwrap_err();
    assert!(error.is_validation());
    assert_eq!(ctx.store.load(&account_id).await?, before);

    assert!(ctx.service.authenticate(EMAIL, GOOD).await?.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn test_a_change_pushes_expiry_out_by_the_rotation_period() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    ctx.service.advance(Duration::days(45));
    assert!(matches!(ctx.service.authenticate(EMAIL, GOOD).await?,
        AuthResponse::Authenticated(principal) if principal.must_change_password));

    let view = ctx.service.change_password(&account_id, "N3w!Password").await?;
    assert_eq!(view.password_expiration_date, ctx.service.now() + Duration::days(30));
    assert_gt!(view.password_expiration_date, start() + Duration::days(30));
    assert_eq!(ctx.notifier.topics().last(), Some(&"account.password.rotated"));

    assert!(!ctx.service.authenticate(EMAIL, GOOD).await?.is_authenticated());
    assert!(matches!(ctx.service.authenticate(EMAIL, "N3w!Password").await?,
        AuthResponse::Authenticated(principal) if !principal.must_change_password));
    Ok(())
}

#[tokio::test]
async fn test_a_superuser_change_rotates_over_ninety_days() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let view = ctx.service.create_account("root@example.com", "Initial1!", UserType::Superuser).await?;

    let view = ctx.service.change_password(&view.account_id, "N3w!Password").await?;
    assert_eq!(view.password_expiration_date, start() + Duration::days(90));
    Ok(())
}

#[tokio::test]
async fn test_changing_the_password_of_an_unknown_account_fails() {
    let ctx = test_context();
    let error = ctx.service.change_password("U-missing", GOOD).await.unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::AccountNotFound);
}

#[tokio::test]
async fn test_the_stored_hash_never_holds_the_plain_text() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    let account = ctx.store.load(&account_id).await?;
    assert!(account.password_hash.starts_with("$2b$"));
    assert!(!account.password_hash.contains(GOOD));
    Ok(())
}
