//! Request-level flows through `ShareService`.

use std::time::Duration;

use anyhow::Result;

use vaultshare::{ErrorKind, ShareConfig, ShareRequest, UserId};
use vaultshare_testkit::{init_tracing, random_pass, TestFixture};

fn request(user: &str, pass: &str) -> ShareRequest {
    ShareRequest {
        name: "Github".into(),
        pass: pass.to_string(),
        user_id: UserId::from(user),
        expire_secs: 3600,
    }
}

#[tokio::test]
async fn test_share_and_redeem() -> Result<()> {
    init_tracing();
    let fx = TestFixture::new();
    let team = fx.add_team("ops", &["alice"]).await?;
    let entry = fx.add_entry(team.id).await;
    let bob = fx.add_user("bob").await;
    let pass = random_pass();
    let service = fx.service();

    let created = service
        .share_entry(&"alice".into(), &entry.id.to_hex(), request("bob", &pass))
        .await?;
    assert_eq!(created.team_id, team.id);
    assert_eq!(created.user_id, bob);

    let redeemed = service.redeem(&created.id.to_hex(), &bob, &pass).await?;
    assert_eq!(redeemed, created);

    let listed = service.list_for_user(&bob).await?;
    assert_eq!(listed, vec![created.clone()]);
    assert_eq!(service.list_for_entry(&entry.id.to_hex()).await?.len(), 1);
    assert_eq!(service.list_for_team(&team.id.to_hex()).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_redeem_rejections() -> Result<()> {
    let fx = TestFixture::new();
    let team = fx.add_team("ops", &["alice"]).await?;
    let entry = fx.add_entry(team.id).await;
    let bob = fx.add_user("bob").await;
    let pass = random_pass();
    let service = fx.service();

    let created = service
        .share_entry(&"alice".into(), &entry.id.to_hex(), request("bob", &pass))
        .await?;
    let share_id = created.id.to_hex();

    let err = service.redeem(&share_id, &bob, &random_pass()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = service
        .redeem(&share_id, &"alice".into(), &pass)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Rotating the entry key makes old tokens unreadable.
    let mut rotated = entry.clone();
    rotated.access_key = vaultshare_testkit::random_access_key();
    fx.entries.insert(rotated).await;
    let err = service.redeem(&share_id, &bob, &pass).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);

    fx.entries.remove(&entry.id).await;
    let err = service.redeem(&share_id, &bob, &pass).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_share_entry_checks() -> Result<()> {
    let fx = TestFixture::new();
    let team = fx.add_team("ops", &["alice"]).await?;
    let entry = fx.add_entry(team.id).await;
    fx.add_user("bob").await;
    fx.add_user("mallory").await;
    let pass = random_pass();
    let service = fx.service();
    let alice = UserId::from("alice");

    let err = service
        .share_entry(&alice, "not-an-oid", request("bob", &pass))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

    let mut short = request("bob", &pass);
    short.expire_secs = 5;
    let err = service
        .share_entry(&alice, &entry.id.to_hex(), short)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = service
        .share_entry(&alice, &entry.id.to_hex(), request("nobody", &pass))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let missing = vaultshare::Oid::new();
    let err = service
        .share_entry(&alice, &missing.to_hex(), request("bob", &pass))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .share_entry(&"mallory".into(), &entry.id.to_hex(), request("bob", &pass))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    assert!(service.list_for_entry(&entry.id.to_hex()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_revoke_flow() -> Result<()> {
    let fx = TestFixture::new();
    let team = fx.add_team("ops", &["alice"]).await?;
    let entry = fx.add_entry(team.id).await;
    let bob = fx.add_user("bob").await;
    let pass = random_pass();
    let service = fx.service();

    let created = service
        .share_entry(&"alice".into(), &entry.id.to_hex(), request("bob", &pass))
        .await?;
    let share_id = created.id.to_hex();

    let err = service.revoke("xyz", &bob).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

    let err = service.revoke(&share_id, &bob).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    service.revoke(&share_id, &"alice".into()).await?;
    let err = service.redeem(&share_id, &bob, &pass).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_configured_min_expire() -> Result<()> {
    let fx = TestFixture::with_config(ShareConfig::from_json(r#"{"min_expire_secs": 60}"#)?);
    let team = fx.add_team("ops", &["alice"]).await?;
    let entry = fx.add_entry(team.id).await;
    fx.add_user("bob").await;
    let service = fx.service();

    let mut req = request("bob", &random_pass());
    req.expire_secs = 30;
    let err = service
        .share_entry(&"alice".into(), &entry.id.to_hex(), req.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    req.expire_secs = 60;
    let created = service
        .share_entry(&"alice".into(), &entry.id.to_hex(), req)
        .await?;

    fx.clock.advance(Duration::from_secs(61));
    let err = fx.shares.find(created.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}
