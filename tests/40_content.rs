mod common;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{expect_data, parse_id, SeededOrg};

async fn create_embed(client: &Client, org: &SeededOrg, name: &str) -> Result<reqwest::Response> {
    let server = common::ensure_server().await?;
    Ok(client
        .post(server.url("/api/embeds"))
        .bearer_auth(&org.owner_token)
        .json(&json!({"name": name}))
        .send()
        .await?)
}

async fn create_group(
    client: &Client,
    org: &SeededOrg,
    embed_id: Uuid,
    title: &str,
) -> Result<Uuid> {
    let server = common::ensure_server().await?;
    let res = client
        .post(server.url(&format!("/api/embeds/{}/groups", embed_id)))
        .bearer_auth(&org.owner_token)
        .json(&json!({"title": title}))
        .send()
        .await?;
    parse_id(&expect_data(res, StatusCode::CREATED).await?["id"])
}

async fn create_variant(
    client: &Client,
    org: &SeededOrg,
    group_id: Uuid,
    language: &str,
) -> Result<reqwest::Response> {
    let server = common::ensure_server().await?;
    Ok(client
        .post(server.url(&format!("/api/groups/{}/variants", group_id)))
        .bearer_auth(&org.owner_token)
        .json(&json!({"language": language}))
        .send()
        .await?)
}

async fn embed_detail(client: &Client, org: &SeededOrg, embed_id: Uuid) -> Result<Value> {
    let server = common::ensure_server().await?;
    let res = client
        .get(server.url(&format!("/api/embeds/{}", embed_id)))
        .bearer_auth(&org.owner_token)
        .send()
        .await?;
    expect_data(res, StatusCode::OK).await
}

#[tokio::test]
async fn free_plan_caps_embeds() -> Result<()> {
    if !common::database_ready().await? {
        return Ok(());
    }
    let org = common::seed_org("free").await?;
    let client = Client::new();

    for i in 0..3 {
        let res = create_embed(&client, &org, &format!("Embed {}", i)).await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }
    let res = create_embed(&client, &org, "One too many").await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::error_code(res).await?, "PLAN_LIMIT_REACHED");
    Ok(())
}

#[tokio::test]
async fn variants_are_unique_per_language_and_capped_per_group() -> Result<()> {
    if !common::database_ready().await? {
        return Ok(());
    }
    let org = common::seed_org("free").await?;
    let client = Client::new();

    let res = create_embed(&client, &org, "Onboarding").await?;
    let embed = expect_data(res, StatusCode::CREATED).await?;
    let group_id = create_group(&client, &org, parse_id(&embed["id"])?, "Welcome").await?;

    let res = create_variant(&client, &org, group_id, "en").await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = create_variant(&client, &org, group_id, "en").await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(common::error_code(res).await?, "CONFLICT");

    let res = create_variant(&client, &org, group_id, "fr").await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Free allows two variants per group
    let res = create_variant(&client, &org, group_id, "de").await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::error_code(res).await?, "PLAN_LIMIT_REACHED");
    Ok(())
}

#[tokio::test]
async fn reorder_with_a_foreign_id_changes_nothing() -> Result<()> {
    if !common::database_ready().await? {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let org = common::seed_org("starter").await?;
    let client = Client::new();

    let res = create_embed(&client, &org, "Tour").await?;
    let embed = expect_data(res, StatusCode::CREATED).await?;
    let embed_id = parse_id(&embed["id"])?;
    let first = create_group(&client, &org, embed_id, "First").await?;
    let second = create_group(&client, &org, embed_id, "Second").await?;

    let res = client
        .put(server.url(&format!("/api/embeds/{}/groups/order", embed_id)))
        .bearer_auth(&org.owner_token)
        .json(&json!({"items": [
            {"id": second, "sort_order": 0},
            {"id": first, "sort_order": 1},
            {"id": Uuid::new_v4(), "sort_order": 2},
        ]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let detail = embed_detail(&client, &org, embed_id).await?;
    let titles: Vec<_> = detail["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["First", "Second"]);

    // The same batch without the stranger goes through
    let res = client
        .put(server.url(&format!("/api/embeds/{}/groups/order", embed_id)))
        .bearer_auth(&org.owner_token)
        .json(&json!({"items": [
            {"id": second, "sort_order": 0},
            {"id": first, "sort_order": 1},
        ]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let detail = embed_detail(&client, &org, embed_id).await?;
    assert_eq!(detail["groups"][0]["title"], "Second");
    Ok(())
}

#[tokio::test]
async fn views_count_only_published_embeds_and_roll_back_on_foreign_variant() -> Result<()> {
    if !common::database_ready().await? {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let org = common::seed_org("starter").await?;
    let client = Client::new();

    let res = create_embed(&client, &org, "Promo").await?;
    let embed = expect_data(res, StatusCode::CREATED).await?;
    let embed_id = parse_id(&embed["id"])?;
    let group_id = create_group(&client, &org, embed_id, "Intro").await?;
    let res = create_variant(&client, &org, group_id, "en").await?;
    let variant = expect_data(res, StatusCode::CREATED).await?;
    let variant_id = parse_id(&variant["id"])?;
    let views_url = server.url(&format!("/embed/{}/views", embed_id));

    // Drafts are invisible to the player
    let res = client.post(&views_url).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(server.url(&format!("/embed/{}", embed_id))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .patch(server.url(&format!("/api/embeds/{}", embed_id)))
        .bearer_auth(&org.owner_token)
        .json(&json!({"is_published": true}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let counts = expect_data(client.post(&views_url).send().await?, StatusCode::OK).await?;
    assert_eq!(counts["embed_views"], 1);
    assert!(counts["variant_views"].is_null());

    let res = client
        .post(&views_url)
        .json(&json!({"variant_id": Uuid::new_v4()}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let counts = expect_data(
        client.post(&views_url).json(&json!({"variant_id": variant_id})).send().await?,
        StatusCode::OK,
    )
    .await?;
    assert_eq!(counts["embed_views"], 2, "foreign variant must not leave an embed view behind");
    assert_eq!(counts["variant_views"], 1);
    Ok(())
}
