mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{id_of, json_of, TestApp};

async fn seed_cards(app: &TestApp, token: &str, n: usize) -> Result<Vec<Value>> {
    let mut cards = Vec::with_capacity(n);
    for i in 0..n {
        let status = if i % 3 == 0 { "draft" } else { "active" };
        cards.push(
            app.create_card(
                token,
                json!({ "title": format!("Card {:02}", i), "full_name": "Ann Lee", "status": status }),
            )
            .await?,
        );
    }
    Ok(cards)
}

#[tokio::test]
async fn create_applies_defaults() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;
    let user_id = app.user_id(&token).await?;

    let card = app
        .create_card(&token, json!({ "title": "Founder", "full_name": "Ann Lee", "email": "ANN@Example.com" }))
        .await?;
    assert_eq!(card["status"], "active");
    assert_eq!(card["visibility"], "public");
    assert_eq!(card["views"], 0);
    assert_eq!(card["user"], user_id.as_str());
    assert_eq!(card["email"], "ann@example.com");

    let res = app.post("/api/cards", &token, json!({ "title": "No name" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_of(res).await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("full_name").is_some());

    let res = app
        .post(
            "/api/cards",
            &token,
            json!({ "title": "Bad", "full_name": "Ann", "website": "ftp://example.com", "visibility": "secret" }),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_of(res).await?;
    assert!(body["field_errors"].get("website").is_some());
    assert!(body["field_errors"].get("visibility").is_some());
    Ok(())
}

#[tokio::test]
async fn new_cards_follow_the_default_visibility_setting() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;

    let res = app.get("/api/settings", &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_of(res).await?["data"]["default_visibility"], "public");

    let res = app
        .put("/api/settings", &token, json!({ "default_visibility": "private", "theme": "dark" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_of(res).await?["data"]["theme"], "dark");

    let card = app.create_card(&token, json!({ "title": "Quiet", "full_name": "Ann" })).await?;
    assert_eq!(card["visibility"], "private");

    let res = app.put("/api/settings", &token, json!({ "theme": "neon" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn listing_paginates_with_next_and_prev() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;
    seed_cards(&app, &token, 30).await?;

    let res = app
        .get("/api/cards", &token)
        .query(&[("sort", "title"), ("page", "2"), ("limit", "10")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_of(res).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 10);
    assert_eq!(body["data"][0]["title"], "Card 10");
    assert_eq!(body["data"][9]["title"], "Card 19");
    assert_eq!(body["pagination"]["next"], json!({ "page": 3, "limit": 10 }));
    assert_eq!(body["pagination"]["prev"], json!({ "page": 1, "limit": 10 }));

    let body = json_of(
        app.get("/api/cards", &token)
            .query(&[("sort", "title"), ("page", "3"), ("limit", "10")])
            .send()
            .await?,
    )
    .await?;
    assert_eq!(body["count"], 10);
    assert!(body["pagination"].get("next").is_none());
    assert_eq!(body["pagination"]["prev"]["page"], 2);

    // Defaults: first page of 25, no prev
    let body = json_of(app.get("/api/cards", &token).send().await?).await?;
    assert_eq!(body["count"], 25);
    assert_eq!(body["pagination"]["next"], json!({ "page": 2, "limit": 25 }));
    assert!(body["pagination"].get("prev").is_none());

    // Past the end
    let body = json_of(app.get("/api/cards", &token).query(&[("page", "9")]).send().await?).await?;
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn listing_filters_sorts_and_selects() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;
    seed_cards(&app, &token, 9).await?;

    let body = json_of(
        app.get("/api/cards", &token)
            .query(&[("status", "draft"), ("sort", "-title")])
            .send()
            .await?,
    )
    .await?;
    assert_eq!(body["count"], 3);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|row| row["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["Card 06", "Card 03", "Card 00"]);

    let body = json_of(
        app.get("/api/cards", &token)
            .query(&[("title[in]", "Card 01,Card 02,Card 99"), ("select", "title,status")])
            .send()
            .await?,
    )
    .await?;
    assert_eq!(body["count"], 2);
    for row in body["data"].as_array().into_iter().flatten() {
        let mut keys: Vec<&str> = row.as_object().map(|o| o.keys().map(String::as_str).collect()).unwrap_or_default();
        keys.sort_unstable();
        assert_eq!(keys, vec!["id", "status", "title"]);
    }

    let body = json_of(
        app.get("/api/cards", &token)
            .query(&[("status", "nothing-like-this")])
            .send()
            .await?,
    )
    .await?;
    assert_eq!(body, json!({ "success": true, "count": 0, "pagination": {}, "data": [] }));
    Ok(())
}

#[tokio::test]
async fn listing_rejects_unknown_filters() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;

    for query in [
        [("password", "x")],
        [("views[regex]", "1")],
        [("views[gt]", "many")],
    ] {
        let res = app.get("/api/cards", &token).query(&query).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "query {:?}", query);
        assert_eq!(json_of(res).await?["code"], "INVALID_FILTER");
    }

    let res = app.get("/api/cards", &token).query(&[("sort", "password")]).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn public_cards_count_views() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;

    let public = app.create_card(&token, json!({ "title": "Open", "full_name": "Ann" })).await?;
    let private = app
        .create_card(&token, json!({ "title": "Closed", "full_name": "Ann", "visibility": "private" }))
        .await?;
    let draft = app
        .create_card(&token, json!({ "title": "Later", "full_name": "Ann", "status": "draft" }))
        .await?;

    let url = app.url(&format!("/api/cards/public/{}", id_of(&public)));
    for expected in 1..=3 {
        let res = app.client.get(&url).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_of(res).await?["data"]["views"], expected);
    }

    for hidden in [&private, &draft] {
        let res = app
            .client
            .get(app.url(&format!("/api/cards/public/{}", id_of(hidden))))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = app.client.get(app.url("/api/cards/public/not-a-uuid")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Range filters on the view counter
    let body = json_of(app.get("/api/cards", &token).query(&[("views[gte]", "2")]).send().await?).await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["id"], public["id"]);
    Ok(())
}

#[tokio::test]
async fn concurrent_public_views_are_all_counted() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;
    let card = app.create_card(&token, json!({ "title": "Open", "full_name": "Ann" })).await?;
    let url = app.url(&format!("/api/cards/public/{}", id_of(&card)));

    let views: Vec<_> = (0..25)
        .map(|_| {
            let client = app.client.clone();
            let url = url.clone();
            tokio::spawn(async move { client.get(&url).send().await.map(|res| res.status()) })
        })
        .collect();
    for view in views {
        assert_eq!(view.await??, StatusCode::OK);
    }

    let body = json_of(app.get(&format!("/api/cards/{}", id_of(&card)), &token).send().await?).await?;
    assert_eq!(body["data"]["views"], 25);
    Ok(())
}

#[tokio::test]
async fn update_and_delete_own_card() -> Result<()> {
    let app = TestApp::spawn().await?;
    let token = app.register("Ann", "ann@example.com").await?;
    let card = app.create_card(&token, json!({ "title": "Old", "full_name": "Ann" })).await?;
    let path = format!("/api/cards/{}", id_of(&card));

    let res = app.put(&path, &token, json!({ "title": "New", "status": "inactive" })).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_of(res).await?;
    assert_eq!(body["data"]["title"], "New");
    assert_eq!(body["data"]["full_name"], "Ann");
    assert_eq!(body["data"]["status"], "inactive");

    let res = app.delete(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_of(res).await?, json!({ "success": true, "data": {} }));

    assert_eq!(app.get(&path, &token).send().await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}
