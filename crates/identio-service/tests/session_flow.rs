//! End-to-end refresh-token session scenarios.

mod common;

use common::{client_ip, harness, registration};
use identio_data::model::SessionKind;
use identio_service::ErrorKind;
use jiff::Span;

const SESSION_TTL_HOURS: i64 = 90 * 24;

#[tokio::test]
async fn sessions_expire_on_a_sliding_window() -> anyhow::Result<()> {
    let h = harness();

    let bob = h
        .service
        .register(registration("bob", "bob@example.com"))
        .await?;
    let session = h
        .service
        .create_session(bob.account.id, client_ip(), "test-agent", SessionKind::User)
        .await?;

    assert_eq!(
        session.expires_at,
        h.clock.now() + Span::new().hours(SESSION_TTL_HOURS)
    );
    assert_eq!(session.last_used_at, session.created_at);
    assert_eq!(session.kind, SessionKind::User);

    // One day later: rotation replaces the token and slides the window.
    h.clock.advance(Span::new().hours(24));
    let new_ip = "198.51.100.7/32".parse()?;
    let rotated = h
        .service
        .refresh_session(&session.refresh_token, new_ip)
        .await?;

    assert_eq!(rotated.id, session.id);
    assert_ne!(rotated.refresh_token, session.refresh_token);
    assert_eq!(rotated.client_ip, new_ip);
    assert_eq!(rotated.last_used_at, h.clock.now());
    assert_eq!(
        rotated.expires_at,
        h.clock.now() + Span::new().hours(SESSION_TTL_HOURS)
    );

    // The old token is spent.
    let err = h
        .service
        .refresh_session(&session.refresh_token, new_ip)
        .await
        .expect_err("consumed token");
    assert_eq!(err.kind(), ErrorKind::InvalidToken);

    Ok(())
}

#[tokio::test]
async fn expired_sessions_stay_dead() -> anyhow::Result<()> {
    let h = harness();

    let bob = h
        .service
        .register(registration("bob", "bob@example.com"))
        .await?;
    let session = h
        .service
        .create_session(bob.account.id, client_ip(), "test-agent", SessionKind::User)
        .await?;

    h.clock
        .advance(Span::new().hours(SESSION_TTL_HOURS).seconds(1));

    let err = h
        .service
        .refresh_session(&session.refresh_token, client_ip())
        .await
        .expect_err("expired session");
    assert_eq!(err.kind(), ErrorKind::TokenExpired);

    // No resurrection: the same presentation keeps failing.
    let err = h
        .service
        .refresh_session(&session.refresh_token, client_ip())
        .await
        .expect_err("still expired");
    assert_eq!(err.kind(), ErrorKind::TokenExpired);

    Ok(())
}

#[tokio::test]
async fn concurrent_rotation_has_exactly_one_winner() -> anyhow::Result<()> {
    let h = harness();

    let bob = h
        .service
        .register(registration("bob", "bob@example.com"))
        .await?;
    let session = h
        .service
        .create_session(bob.account.id, client_ip(), "test-agent", SessionKind::User)
        .await?;

    let (first, second) = tokio::join!(
        h.service.refresh_session(&session.refresh_token, client_ip()),
        h.service.refresh_session(&session.refresh_token, client_ip()),
    );

    let outcomes = [first, second];
    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1, "exactly one rotation may win");

    let loser = outcomes
        .iter()
        .find(|outcome| outcome.is_err())
        .and_then(|outcome| outcome.as_ref().err())
        .expect("one rotation must lose");
    assert_eq!(loser.kind(), ErrorKind::InvalidToken);

    Ok(())
}

#[tokio::test]
async fn revocation_is_terminal_and_idempotent() -> anyhow::Result<()> {
    let h = harness();

    let bob = h
        .service
        .register(registration("bob", "bob@example.com"))
        .await?;
    let session = h
        .service
        .create_session(bob.account.id, client_ip(), "test-agent", SessionKind::User)
        .await?;

    h.service.revoke_session(session.id).await?;
    // Revoking again is not an error.
    h.service.revoke_session(session.id).await?;

    let err = h
        .service
        .refresh_session(&session.refresh_token, client_ip())
        .await
        .expect_err("revoked session");
    assert_eq!(err.kind(), ErrorKind::TokenExpired);

    let err = h
        .service
        .session(session.id)
        .await
        .expect_err("revoked session lookup");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn revoke_all_covers_every_device() -> anyhow::Result<()> {
    let h = harness();

    let bob = h
        .service
        .register(registration("bob", "bob@example.com"))
        .await?;

    let browser = h
        .service
        .create_session(bob.account.id, client_ip(), "browser", SessionKind::User)
        .await?;
    let cli = h
        .service
        .create_session(bob.account.id, client_ip(), "cli", SessionKind::Api)
        .await?;

    let active = h.service.sessions(bob.account.id).await?;
    assert_eq!(active.len(), 2);

    let revoked = h.service.revoke_all_sessions(bob.account.id).await?;
    assert_eq!(revoked, 2);
    assert!(h.service.sessions(bob.account.id).await?.is_empty());

    for token in [&browser.refresh_token, &cli.refresh_token] {
        let err = h
            .service
            .refresh_session(token, client_ip())
            .await
            .expect_err("revoked session");
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    Ok(())
}

#[tokio::test]
async fn deleting_the_account_kills_its_sessions() -> anyhow::Result<()> {
    let h = harness();

    let bob = h
        .service
        .register(registration("bob", "bob@example.com"))
        .await?;
    let session = h
        .service
        .create_session(bob.account.id, client_ip(), "test-agent", SessionKind::User)
        .await?;

    h.service.delete_account(bob.account.id).await?;

    let err = h
        .service
        .refresh_session(&session.refresh_token, client_ip())
        .await
        .expect_err("deleted account session");
    assert_eq!(err.kind(), ErrorKind::TokenExpired);

    // And no new sessions can be opened for the deleted account.
    let err = h
        .service
        .create_session(bob.account.id, client_ip(), "test-agent", SessionKind::User)
        .await
        .expect_err("deleted account");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn revoke_by_token_matches_logout_semantics() -> anyhow::Result<()> {
    let h = harness();

    let bob = h
        .service
        .register(registration("bob", "bob@example.com"))
        .await?;
    let session = h
        .service
        .create_session(bob.account.id, client_ip(), "test-agent", SessionKind::User)
        .await?;

    h.service
        .revoke_session_by_token(&session.refresh_token)
        .await?;
    // Unknown tokens are ignored, not errors.
    h.service.revoke_session_by_token("no-such-token").await?;

    let err = h
        .service
        .refresh_session(&session.refresh_token, client_ip())
        .await
        .expect_err("logged-out session");
    assert_eq!(err.kind(), ErrorKind::TokenExpired);

    Ok(())
}
