use chrono::Duration;
use more_asserts::assert_le;
use gatekeeper::{AccountStore, AuthResponse, Rejection};
use gatekeeper::utils::errors::{ErrorCode, GatekeeperError};
use crate::common::{BAD, EMAIL, GOOD, test_context};
mod common;

#[tokio::test]
async fn test_five_failures_lock_the_account_and_the_sixth_is_rejected_as_locked() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    for remaining in (1..5).rev() {
        let response = ctx.service.authenticate(EMAIL, BAD).await?;
        assert_eq!(response, AuthResponse::Rejected(Rejection::BadSecret { attempts_remaining: remaining }));
        ctx.service.advance(Duration::minutes(1));
    }

    // The fifth failure exhausts the allowance.
    let response = ctx.service.authenticate(EMAIL, BAD).await?;
    assert_eq!(response, AuthResponse::Rejected(Rejection::Locked));
    assert_eq!(ctx.notifier.topics().last(), Some(&"account.locked"));

    let account = ctx.store.load(&account_id).await?;
    assert!(account.is_locked);
    assert_eq!(account.failed_login_attempts, 5);

    // Even the right password is refused now, and nothing changes.
    let response = ctx.service.authenticate(EMAIL, GOOD).await?;
    assert_eq!(response, AuthResponse::Rejected(Rejection::Locked));
    assert_eq!(ctx.store.load(&account_id).await?, account);
    Ok(())
}

#[tokio::test]
async fn test_failures_outside_the_window_are_forgiven() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    for _ in 0..3 {
        ctx.service.authenticate(EMAIL, BAD).await?;
    }

    ctx.service.advance(Duration::hours(25));

    let response = ctx.service.authenticate(EMAIL, BAD).await?;
    assert_eq!(response, AuthResponse::Rejected(Rejection::BadSecret { attempts_remaining: 4 }));

    let account = ctx.store.load(&account_id).await?;
    assert_eq!(account.failed_login_attempts, 1);
    assert_eq!(account.login_attempts_reset_date, ctx.service.now() + Duration::days(1));
    Ok(())
}

#[tokio::test]
async fn test_a_successful_login_clears_earlier_failures() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    for _ in 0..4 {
        ctx.service.authenticate(EMAIL, BAD).await?;
    }

    let response = ctx.service.authenticate(EMAIL, GOOD).await?;
    assert!(response.is_authenticated());
    assert_eq!(ctx.store.load(&account_id).await?.failed_login_attempts, 0);

    // A full allowance is available again.
    let response = ctx.service.authenticate(EMAIL, BAD).await?;
    assert_eq!(response, AuthResponse::Rejected(Rejection::BadSecret { attempts_remaining: 4 }));
    Ok(())
}

#[tokio::test]
async fn test_unlock_restores_access_without_a_secret() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    for _ in 0..5 {
        ctx.service.authenticate(EMAIL, BAD).await?;
    }

    ctx.service.advance(Duration::hours(1));
    let view = ctx.service.unlock(&account_id).await?;
    assert!(!view.is_locked);
    assert_eq!(view.failed_login_attempts, 0);
    assert_eq!(ctx.store.load(&account_id).await?.login_attempts_reset_date, ctx.service.now());
    assert_eq!(ctx.notifier.topics().last(), Some(&"account.unlocked"));

    match ctx.service.authenticate(EMAIL, GOOD).await? {
        AuthResponse::Authenticated(principal) => {
            assert_eq!(principal.account_id, account_id);
            assert!(!principal.must_change_password);
        },
        other => panic!("Expected to authenticate, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_unlocking_an_unknown_account_fails() {
    let ctx = test_context();
    let error = ctx.service.unlock("U-missing").await.unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::AccountNotFound);
}

#[tokio::test]
async fn test_an_unknown_email_is_rejected_like_a_first_failure() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    ctx.standard_account().await?;

    let unknown = ctx.service.authenticate("nobody@example.com", BAD).await?;
    let known = ctx.service.authenticate(EMAIL, BAD).await?;

    assert_eq!(unknown, known);
    match unknown {
        AuthResponse::Rejected(rejection) => assert_eq!(rejection.message(),
            "Invalid credentials. 4 attempts left before this account is locked."),
        other => panic!("Expected a rejection, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_an_unknown_email_counts_down_and_locks_like_a_real_account() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    ctx.standard_account().await?;

    let mut known = vec!();
    let mut unknown = vec!();

    for _ in 0..6 {
        known.push(ctx.service.authenticate(EMAIL, BAD).await?);
        unknown.push(ctx.service.authenticate("Nobody@Example.com", BAD).await?);
        ctx.service.advance(Duration::minutes(1));
    }

    assert_eq!(known, unknown);
    assert_eq!(unknown[3], AuthResponse::Rejected(Rejection::BadSecret { attempts_remaining: 1 }));
    assert_eq!(unknown[4], AuthResponse::Rejected(Rejection::Locked));
    assert_eq!(unknown[5], AuthResponse::Rejected(Rejection::Locked));

    // The locked stand-in stays locked, as a real account would until it's unlocked.
    ctx.service.advance(Duration::days(3));
    assert_eq!(ctx.service.authenticate("nobody@example.com", BAD).await?, AuthResponse::Rejected(Rejection::Locked));
    Ok(())
}

#[tokio::test]
async fn test_an_unknown_email_forgets_failures_after_the_window() -> Result<(), GatekeeperError> {
    let ctx = test_context();

    for _ in 0..3 {
        ctx.service.authenticate("nobody@example.com", BAD).await?;
    }

    ctx.service.advance(Duration::hours(25));

    let response = ctx.service.authenticate("nobody@example.com", BAD).await?;
    assert_eq!(response, AuthResponse::Rejected(Rejection::BadSecret { attempts_remaining: 4 }));
    Ok(())
}

#[tokio::test]
async fn test_failures_against_an_email_before_it_is_registered_are_not_carried_over() -> Result<(), GatekeeperError> {
    let ctx = test_context();

    for _ in 0..5 {
        ctx.service.authenticate(EMAIL, BAD).await?;
    }

    ctx.standard_account().await?;
    assert!(ctx.service.authenticate(EMAIL, GOOD).await?.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn test_a_lock_notification_outage_does_not_undo_the_lock() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;
    ctx.notifier.set_failing(true);

    for _ in 0..5 {
        ctx.service.authenticate(EMAIL, BAD).await?;
    }

    assert!(ctx.store.load(&account_id).await?.is_locked);
    Ok(())
}

#[tokio::test]
async fn test_a_stale_snapshot_cannot_overwrite_a_newer_decision() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    let stale = ctx.store.load(&account_id).await?;
    ctx.service.authenticate(EMAIL, BAD).await?;

    let error = ctx.store.replace(&stale).await.unwrap_err();
    assert_eq!(error.error_code(), ErrorCode::ConcurrentModification);
    assert_eq!(ctx.store.load(&account_id).await?.failed_login_attempts, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_are_never_lost() -> Result<(), GatekeeperError> {
    let ctx = test_context();
    let account_id = ctx.standard_account().await?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = ctx.service.clone();
            tokio::spawn(async move { service.authenticate(EMAIL, BAD).await })
        })
        .collect();

    let mut written = 0;
    for handle in handles {
        match handle.await.expect("authentication task panicked") {
            Ok(_) => written += 1,
            Err(err) => assert_eq!(err.error_code(), ErrorCode::ConcurrentModification),
        }
    }

    // Every attempt that reported a result was counted, the rest were refused outright.
    let account = ctx.store.load(&account_id).await?;
    assert_eq!(account.failed_login_attempts, written);
    assert_le!(written, 4);
    Ok(())
}
