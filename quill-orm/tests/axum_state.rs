#![cfg(feature = "axum")]

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use quill_orm::integrations::axum::QuillState;
use quill_orm::prelude::*;
use quill_orm::sqlx::Sqlite;
use tower::ServiceExt;

#[derive(Model, Debug, Clone)]
#[quill(table = "notes")]
struct Note {
    #[quill(primary_key)]
    id: i64,
    text: String,
}

async fn show(
    State(pool): State<Pool<Sqlite>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let note = Note::find(&pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({ "id": note.id, "text": note.text })))
}

#[tokio::test]
async fn handlers_extract_the_pool_from_quill_state() {
    let pool = quill_orm::test_utils::memory_pool().await.unwrap();
    Quill::sync::<Sqlite, Note>(&pool).await.unwrap();
    let mut note = Note {
        id: 7,
        text: "hi".into(),
    };
    note.save(&pool).await.unwrap();

    let app = Router::new()
        .route("/notes/{id}", get(show))
        .with_state(QuillState::new(pool));

    let response = app
        .clone()
        .oneshot(Request::get("/notes/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["text"], "hi");

    let missing = app
        .oneshot(Request::get("/notes/8").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
