mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{created_id, Session};

fn names(body: &Value) -> Vec<Value> {
    body["sections"]
        .as_array()
        .map(|sections| sections.iter().map(|s| s["name"].clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn create_validates_name_and_color() -> Result<()> {
    let session = Session::new().await?;

    let (status, body) = session.post("/sections", json!({ "color": "blue" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages: Vec<_> = body["details"]
        .as_array()
        .map(|issues| issues.iter().map(|i| i["message"].clone()).collect())
        .unwrap_or_default();
    assert!(messages.contains(&json!("Required")));
    assert!(messages.contains(&json!("Color must be a valid hex code (e.g., #3B82F6)")));

    let (status, body) = session
        .post("/sections", json!({ "name": "Hadith", "color": "#3B82F6" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["section"]["color"], "#3B82F6");
    assert_eq!(body["section"]["order_index"], 0);
    Ok(())
}

#[tokio::test]
async fn reorder_sections() -> Result<()> {
    let session = Session::new().await?;
    let (_, a) = session.post("/sections", json!({ "name": "a", "order_index": 0 })).await?;
    let (_, b) = session.post("/sections", json!({ "name": "b", "order_index": 1 })).await?;
    let (a, b) = (created_id(&a, "section")?, created_id(&b, "section")?);

    let (status, body) = session
        .post(
            "/sections/reorder",
            json!([{ "id": a, "order_index": 1 }, { "id": b, "order_index": 0 }]),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = session.get("/sections").await?;
    assert_eq!(names(&body), vec![json!("b"), json!("a")]);

    let (status, body) = session.post("/sections/reorder", json!({ "sections": [] })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["message"], "At least one section is required");
    Ok(())
}

#[tokio::test]
async fn reorder_rejects_foreign_sections() -> Result<()> {
    let owner = Session::new().await?;
    let stranger = Session::new().await?;
    let (_, body) = owner.post("/sections", json!({ "name": "x", "order_index": 4 })).await?;
    let id = created_id(&body, "section")?;

    let (status, body) = stranger
        .post("/sections/reorder", json!([{ "id": id, "order_index": 0 }]))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Section not found");

    let (_, body) = owner.get(&format!("/sections/{}", id)).await?;
    assert_eq!(body["section"]["order_index"], 4);
    Ok(())
}

#[tokio::test]
async fn section_pages_and_counts() -> Result<()> {
    let session = Session::new().await?;
    let (_, body) = session.post("/sections", json!({ "name": "Notes" })).await?;
    let id = created_id(&body, "section")?;

    for (title, order_index) in [("second", 2), ("first", 1)] {
        session
            .post("/notes", json!({ "title": title, "section_id": id, "order_index": order_index }))
            .await?;
    }

    let (status, body) = session.get(&format!("/sections/{}/pages", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["notes"][0]["title"], "first");

    let (_, body) = session.get(&format!("/sections/{}?include=pages", id)).await?;
    assert_eq!(body["section"]["name"], "Notes");
    assert_eq!(body["section"]["note_pages"].as_array().map(Vec::len), Some(2));

    let (_, body) = session.get(&format!("/sections/{}", id)).await?;
    assert!(body["section"].get("note_pages").is_none());
    Ok(())
}

#[tokio::test]
async fn delete_unfiles_pages() -> Result<()> {
    let session = Session::new().await?;
    let (_, body) = session.post("/sections", json!({ "name": "temp" })).await?;
    let id = created_id(&body, "section")?;
    let (_, body) = session.post("/notes", json!({ "title": "kept", "section_id": id })).await?;
    let note = created_id(&body, "note")?;

    let (status, body) = session.delete(&format!("/sections/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = session.get(&format!("/notes/{}", note)).await?;
    assert!(body["note"]["section_id"].is_null());

    let (status, _) = session.delete(&format!("/sections/{}", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = session.get(&format!("/sections/{}/pages", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_section() -> Result<()> {
    let session = Session::new().await?;
    let (_, body) = session.post("/sections", json!({ "name": "old", "color": "#000000" })).await?;
    let path = format!("/sections/{}", created_id(&body, "section")?);

    let (status, body) = session.patch(&path, json!({ "name": "new", "color": null })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["section"]["name"], "new");
    assert!(body["section"]["color"].is_null());

    let (status, body) = session.patch("/sections/bad", json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid section ID");
    Ok(())
}

#[tokio::test]
async fn client_supplied_owner_is_ignored() -> Result<()> {
    let session = Session::new().await?;
    let (status, body) = session
        .post("/sections", json!({ "name": "mine", "user_id": uuid::Uuid::new_v4() }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["section"]["user_id"], session.user_id.to_string());
    Ok(())
}

#[tokio::test]
async fn other_users_sections_are_invisible() -> Result<()> {
    let owner = Session::new().await?;
    let stranger = Session::new().await?;
    let (_, body) = owner.post("/sections", json!({ "name": "Private" })).await?;
    let path = format!("/sections/{}", created_id(&body, "section")?);

    for (status, body) in [
        stranger.get(&path).await?,
        stranger.get(&format!("{}?include=pages", path)).await?,
        stranger.patch(&path, json!({ "name": "Taken" })).await?,
        stranger.delete(&path).await?,
        stranger.get(&format!("{}/pages", path)).await?,
    ] {
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Section not found");
    }

    let (status, body) = owner.get(&path).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["section"]["name"], "Private");
    Ok(())
}
