mod common;

use anyhow::Result;
use reqwest::StatusCode;

use clipstack_api::auth::{encode_with_secret, Claims};
use clipstack_api::authz::Role;

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    for path in ["/api/session", "/api/embeds", "/api/users", "/api/internal/organizations"] {
        let res = reqwest::get(server.url(path)).await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(common::error_code(res).await?, "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn garbage_and_foreign_tokens_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/api/session"))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let claims = Claims::for_member(
        uuid::Uuid::new_v4(),
        uuid::Uuid::new_v4(),
        "x@example.com",
        Role::Owner,
    );
    let forged = encode_with_secret(&claims, "some-other-secret")?;
    let res = client.get(server.url("/api/session")).bearer_auth(forged).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn non_bearer_schemes_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .get(server.url("/api/embeds"))
        .header("authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn member_tokens_cannot_reach_internal_routes() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::member_token(Role::Owner)?;

    let res = reqwest::Client::new()
        .get(server.url("/api/internal/organizations"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::error_code(res).await?, "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn internal_tokens_are_not_organization_sessions() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::internal_token()?;

    let res = reqwest::Client::new()
        .get(server.url("/api/session"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
