mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{id_of, json_of, TestApp};

#[tokio::test]
async fn connections_between_savers_and_card_owners() -> Result<()> {
    let app = TestApp::spawn().await?;
    let ann = app.register("Ann", "ann@example.com").await?;
    let bob = app.register("Bob", "bob@example.com").await?;
    let eve = app.register("Eve", "eve@example.com").await?;

    let card = app.create_card(&ann, json!({ "title": "Founder", "full_name": "Ann Lee" })).await?;
    let secret = app
        .create_card(&ann, json!({ "title": "Hidden", "full_name": "Ann", "visibility": "private" }))
        .await?;

    let res = app.post("/api/connections", &ann, json!({ "card": id_of(&card) })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.post("/api/connections", &bob, json!({ "card": id_of(&secret) })).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .post("/api/connections", &bob, json!({ "card": id_of(&card), "note": "Met at the expo" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let connection = json_of(res).await?["data"].clone();
    assert_eq!(connection["status"], "pending");
    let path = format!("/api/connections/{}", id_of(&connection));

    let res = app.post("/api/connections", &bob, json!({ "card": id_of(&card) })).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The saver lists it with the card expanded
    let body = json_of(app.get("/api/connections", &bob).send().await?).await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["card"]["full_name"], "Ann Lee");

    // The owner sees it as incoming with the saver expanded
    let body = json_of(app.get("/api/connections/incoming", &ann).send().await?).await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["user"]["name"], "Bob");
    assert!(body["data"][0]["user"].get("password").is_none());

    let body = json_of(app.get("/api/connections/incoming", &bob).send().await?).await?;
    assert_eq!(body["count"], 0);

    assert_eq!(app.get(&path, &eve).send().await?.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.get(&path, &ann).send().await?.status(), StatusCode::OK);

    // Only the owner accepts; only the saver edits the note
    let res = app.put(&path, &bob, json!({ "status": "accepted" })).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.put(&path, &ann, json!({ "note": "Hijacked" })).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.put(&path, &ann, json!({ "status": "maybe" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.put(&path, &ann, json!({ "status": "accepted" })).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_of(res).await?["data"]["status"], "accepted");

    let res = app.put(&path, &bob, json!({ "note": "Follow up in May" })).send().await?;
    assert_eq!(json_of(res).await?["data"]["note"], "Follow up in May");

    assert_eq!(app.delete(&path, &ann).send().await?.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&path, &bob).send().await?.status(), StatusCode::OK);
    assert_eq!(app.get(&path, &bob).send().await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn favourites_are_unique_per_card() -> Result<()> {
    let app = TestApp::spawn().await?;
    let ann = app.register("Ann", "ann@example.com").await?;
    let bob = app.register("Bob", "bob@example.com").await?;
    let card = app.create_card(&ann, json!({ "title": "Founder", "full_name": "Ann" })).await?;

    let res = app.post("/api/favourites", &bob, json!({ "card": id_of(&card) })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let favourite = json_of(res).await?["data"].clone();

    let res = app.post("/api/favourites", &bob, json!({ "card": id_of(&card) })).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(json_of(res).await?["code"], "CONFLICT");

    let res = app
        .post("/api/favourites", &bob, json!({ "card": Uuid::new_v4().to_string() }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = json_of(app.get("/api/favourites", &bob).send().await?).await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["card"]["title"], "Founder");

    let path = format!("/api/favourites/{}", id_of(&favourite));
    assert_eq!(app.delete(&path, &ann).send().await?.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&path, &bob).send().await?.status(), StatusCode::OK);

    let body = json_of(app.get("/api/favourites", &bob).send().await?).await?;
    assert_eq!(body["count"], 0);
    Ok(())
}

#[tokio::test]
async fn collections_hold_cards() -> Result<()> {
    let app = TestApp::spawn().await?;
    let ann = app.register("Ann", "ann@example.com").await?;
    let bob = app.register("Bob", "bob@example.com").await?;
    let first = app.create_card(&ann, json!({ "title": "First", "full_name": "Ann" })).await?;
    let second = app.create_card(&ann, json!({ "title": "Second", "full_name": "Ann" })).await?;

    let res = app
        .post("/api/collections", &bob, json!({ "name": "Leads", "cards": [Uuid::new_v4()] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .post("/api/collections", &bob, json!({ "name": "Leads", "cards": [id_of(&first)] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let collection = json_of(res).await?["data"].clone();
    let path = format!("/api/collections/{}", id_of(&collection));

    let add = format!("{}/cards/{}", path, id_of(&second));
    for _ in 0..2 {
        let res = app.put(&add, &bob, json!({})).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_of(res).await?["data"]["cards"].as_array().map(Vec::len), Some(2));
    }

    let body = json_of(app.get("/api/collections", &bob).send().await?).await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["cards"][0]["title"], "First");
    assert_eq!(body["data"][0]["cards"][1]["title"], "Second");

    assert_eq!(app.put(&add, &ann, json!({})).send().await?.status(), StatusCode::FORBIDDEN);

    let remove = format!("{}/cards/{}", path, id_of(&first));
    assert_eq!(app.delete(&remove, &bob).send().await?.status(), StatusCode::OK);
    assert_eq!(app.delete(&remove, &bob).send().await?.status(), StatusCode::NOT_FOUND);

    // Deleted cards drop out of the expanded listing
    assert_eq!(
        app.delete(&format!("/api/cards/{}", id_of(&second)), &ann).send().await?.status(),
        StatusCode::OK
    );
    let body = json_of(app.get("/api/collections", &bob).send().await?).await?;
    assert_eq!(body["data"][0]["cards"], json!([]));

    let res = app.put(&path, &bob, json!({ "name": "Hot leads" })).send().await?;
    assert_eq!(json_of(res).await?["data"]["name"], "Hot leads");
    assert_eq!(app.delete(&path, &bob).send().await?.status(), StatusCode::OK);
    assert_eq!(app.get(&path, &bob).send().await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deleting_a_card_removes_its_favourites_and_connections() -> Result<()> {
    let app = TestApp::spawn().await?;
    let ann = app.register("Ann", "ann@example.com").await?;
    let bob = app.register("Bob", "bob@example.com").await?;
    let card = app.create_card(&ann, json!({ "title": "Founder", "full_name": "Ann" })).await?;

    app.post("/api/favourites", &bob, json!({ "card": id_of(&card) })).send().await?;
    app.post("/api/connections", &bob, json!({ "card": id_of(&card) })).send().await?;

    let res = app.delete(&format!("/api/cards/{}", id_of(&card)), &ann).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_of(app.get("/api/favourites", &bob).send().await?).await?;
    assert_eq!(body["count"], 0);
    let body = json_of(app.get("/api/connections", &bob).send().await?).await?;
    assert_eq!(body["count"], 0);
    Ok(())
}

#[tokio::test]
async fn private_cards_cannot_be_saved_by_other_users() -> Result<()> {
    let app = TestApp::spawn().await?;
    let ann = app.register("Ann", "ann@example.com").await?;
    let bob = app.register("Bob", "bob@example.com").await?;
    let admin = app.admin().await?;
    let secret = app
        .create_card(&ann, json!({ "title": "Secret", "full_name": "Ann Hidden", "visibility": "private" }))
        .await?;
    let secret_id = id_of(&secret);

    let res = app.post("/api/connections", &bob, json!({ "card": secret_id })).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.post("/api/favourites", &bob, json!({ "card": secret_id })).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .post("/api/collections", &bob, json!({ "name": "Leads", "cards": [secret_id] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.post("/api/collections", &bob, json!({ "name": "Leads" })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let collection = json_of(res).await?["data"].clone();
    let add = format!("/api/collections/{}/cards/{}", id_of(&collection), secret_id);
    assert_eq!(app.put(&add, &bob, json!({})).send().await?.status(), StatusCode::NOT_FOUND);

    // Nothing of the card reached Bob's listings
    let body = json_of(app.get("/api/favourites", &bob).send().await?).await?;
    assert_eq!(body["count"], 0);
    let body = json_of(app.get("/api/collections", &bob).send().await?).await?;
    assert_eq!(body["data"][0]["cards"], json!([]));
    assert!(!body.to_string().contains("Ann Hidden"));

    // The owner and admins may still use it
    let res = app.post("/api/favourites", &ann, json!({ "card": secret_id })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app.post("/api/favourites", &admin, json!({ "card": secret_id })).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}
