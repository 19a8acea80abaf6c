//! Integration tests for the editor client and session.
//!
//! These tests start an in-process axum server on a random port that mimics
//! the content API, then drive it through [`EditorClient`] and
//! [`EditorSession`].

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use npc_editor::prelude::*;
use serde_json::{Value, json};

/// How the mock answers the next requests.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Mode {
    Normal,
    /// `200 {"success": false, "error": ..}`
    Reject(&'static str),
    /// `400 {"success": false, "error": ..}`
    RejectWithStatus(&'static str),
    /// `500` with a plain-text body.
    ServerError,
    /// `200` with a body that is not JSON.
    Garbage,
}

struct Backend {
    data: Value,
    mode: Mode,
    /// `(path, body)` of every POST received.
    writes: Vec<(String, Value)>,
}

type Mock = Arc<Mutex<Backend>>;

fn seed() -> Value {
    json!({
        "npcs": {
            "blacksmith": {
                "name": "Brom",
                "promptKey": "brom_main",
                "inventory": [{"itemId": "sword", "quantity": 1}],
                "stats": {"friendly": 30}
            },
            "innkeeper": {
                "name": "Greta",
                "prompts": {"friendly": {"BAD": "greta_bad", "PERFECT": "greta_perfect"}}
            }
        },
        "prompts": {"brom_main": "Hammer time.", "greta_bad": "Out!"},
        "items": {"sword": {"name": "Iron Sword"}, "bread": {"name": "Rye Bread"}}
    })
}

fn failure(mode: Mode) -> Option<Response> {
    match mode {
        Mode::Normal => None,
        Mode::Reject(reason) => {
            Some(Json(json!({"success": false, "error": reason})).into_response())
        }
        Mode::RejectWithStatus(reason) => Some(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"success": false, "error": reason})),
            )
                .into_response(),
        ),
        Mode::ServerError => {
            Some((StatusCode::INTERNAL_SERVER_ERROR, "database offline").into_response())
        }
        Mode::Garbage => Some((StatusCode::OK, "<html>oops</html>").into_response()),
    }
}

async fn load(State(mock): State<Mock>) -> Response {
    let b = mock.lock().unwrap();
    match b.mode {
        Mode::Normal | Mode::Reject(_) | Mode::RejectWithStatus(_) => {
            Json(b.data.clone()).into_response()
        }
        other => failure(other).unwrap(),
    }
}

async fn save_prompt(State(mock): State<Mock>, Json(body): Json<Value>) -> Response {
    let mut b = mock.lock().unwrap();
    b.writes.push(("npc/prompt".into(), body.clone()));
    if let Some(resp) = failure(b.mode) {
        return resp;
    }
    let key = body["promptKey"].as_str().unwrap_or_default().to_string();
    b.data["prompts"][key] = body["promptText"].clone();
    Json(json!({"success": true})).into_response()
}

async fn update_npc(State(mock): State<Mock>, Json(body): Json<Value>) -> Response {
    let mut b = mock.lock().unwrap();
    b.writes.push(("npc/update".into(), body.clone()));
    if let Some(resp) = failure(b.mode) {
        return resp;
    }
    let id = body["npcId"].as_str().unwrap_or_default().to_string();
    if let (Some(npc), Some(updates)) = (
        b.data["npcs"].get_mut(&id).and_then(Value::as_object_mut),
        body["updates"].as_object(),
    ) {
        for (k, v) in updates {
            npc.insert(k.clone(), v.clone());
        }
    }
    Json(json!({"success": true})).into_response()
}

async fn create_npc(State(mock): State<Mock>, Json(body): Json<Value>) -> Response {
    let mut b = mock.lock().unwrap();
    b.writes.push(("npc/create".into(), body.clone()));
    if let Some(resp) = failure(b.mode) {
        return resp;
    }
    let id = body["npcId"].as_str().unwrap_or_default().to_string();
    if b.data["npcs"].get(&id).is_some() {
        return Json(json!({"success": false, "error": "NPC already exists"})).into_response();
    }
    let record = if body["promptType"] == "tiered" {
        json!({"name": body["name"], "prompts": {"friendly": {
            "BAD": format!("{id}_bad"), "NORMAL": format!("{id}_normal"),
            "GOOD": format!("{id}_good"), "PERFECT": format!("{id}_perfect")
        }}})
    } else {
        json!({"name": body["name"], "promptKey": id})
    };
    b.data["npcs"][id] = record;
    Json(json!({"success": true})).into_response()
}

/// Helper: spawn the mock API on port 0 (random available port).
async fn spawn_mock() -> (Mock, String) {
    let mock: Mock = Arc::new(Mutex::new(Backend {
        data: seed(),
        mode: Mode::Normal,
        writes: Vec::new(),
    }));
    let app = Router::new()
        .route("/api/editor/npcs", get(load))
        .route("/api/editor/npc/prompt", post(save_prompt))
        .route("/api/editor/npc/update", post(update_npc))
        .route("/api/editor/npc/create", post(create_npc))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (mock, format!("http://{addr}/api/editor"))
}

fn set_mode(mock: &Mock, mode: Mode) {
    mock.lock().unwrap().mode = mode;
}

fn client(base: &str) -> EditorClient {
    EditorClient::new(base, Duration::from_secs(5)).unwrap()
}

// ── Client ───────────────────────────────────────────────────────────

#[tokio::test]
async fn load_all_parses_every_collection() {
    let (_mock, base) = spawn_mock().await;
    let data = client(&base).load_all().await.unwrap();

    assert_eq!(data.npcs.len(), 2);
    assert_eq!(data.prompts["brom_main"], "Hammer time.");
    assert_eq!(data.items["bread"].name.as_deref(), Some("Rye Bread"));

    let inn = resolve(data.npcs.get("innkeeper"));
    let tiers: Vec<Tier> = inn.iter().map(|b| b.tier).collect();
    assert_eq!(tiers, vec![Tier::Bad, Tier::Perfect]);
}

#[tokio::test]
async fn load_all_tolerates_one_odd_record() {
    let (mock, base) = spawn_mock().await;
    mock.lock().unwrap().data["npcs"]["oddball"] = json!({
        "name": "Odd",
        "prompts": {"friendly": "legacy"},
        "inventory": [{"item": "sword", "count": 2}, {"itemId": "coin", "quantity": -1}],
        "model": {"path": "m.glb"}
    });

    let data = client(&base).load_all().await.unwrap();
    assert_eq!(data.npcs.len(), 3);
    assert_eq!(
        resolve(data.npcs.get("blacksmith")),
        vec![PromptBinding::friendly(Tier::Default, "brom_main")]
    );

    let odd = &data.npcs["oddball"];
    assert!(resolve(Some(odd)).is_empty());
    assert_eq!(odd.inventory().len(), 2);
    assert!(odd.inventory().iter().all(|e| !e.is_recognized()));
}

#[tokio::test]
async fn write_bodies_use_camel_case() {
    let (mock, base) = spawn_mock().await;
    let api = client(&base);

    api.save_prompt("brom_main", "New text").await.unwrap();
    api.update_npc("blacksmith", &NpcUpdate::name("Bromm"))
        .await
        .unwrap();
    api.create_npc(&NewNpc {
        npc_id: "herbalist".into(),
        name: "Mira".into(),
        prompt_type: PromptType::Tiered,
    })
    .await
    .unwrap();

    let writes = mock.lock().unwrap().writes.clone();
    assert_eq!(
        writes,
        vec![
            (
                "npc/prompt".to_string(),
                json!({"promptKey": "brom_main", "promptText": "New text"})
            ),
            (
                "npc/update".to_string(),
                json!({"npcId": "blacksmith", "updates": {"name": "Bromm"}})
            ),
            (
                "npc/create".to_string(),
                json!({"npcId": "herbalist", "name": "Mira", "promptType": "tiered"})
            ),
        ]
    );
}

#[tokio::test]
async fn success_false_is_rejected() {
    let (mock, base) = spawn_mock().await;
    set_mode(&mock, Mode::Reject("prompt locked"));

    let err = client(&base).save_prompt("k", "t").await.unwrap_err();
    match err {
        EditorError::Rejected(Some(reason)) => assert_eq!(reason, "prompt locked"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn error_status_with_envelope_is_rejected() {
    let (mock, base) = spawn_mock().await;
    set_mode(&mock, Mode::RejectWithStatus("invalid npc id"));

    let err = client(&base)
        .update_npc("nope", &NpcUpdate::name("x"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, EditorError::Rejected(Some(ref r)) if r == "invalid npc id"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn server_error_is_http() {
    let (mock, base) = spawn_mock().await;
    set_mode(&mock, Mode::ServerError);

    match client(&base).load_all().await.unwrap_err() {
        EditorError::Http { status, body } => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "database offline");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let (mock, base) = spawn_mock().await;
    set_mode(&mock, Mode::Garbage);

    let api = client(&base);
    assert!(matches!(
        api.load_all().await.unwrap_err(),
        EditorError::Malformed(_)
    ));
    assert!(matches!(
        api.save_prompt("k", "t").await.unwrap_err(),
        EditorError::Malformed(_)
    ));
}

#[tokio::test]
async fn unknown_route_is_http_404() {
    let (_mock, base) = spawn_mock().await;
    let base = base.replace("/api/editor", "/api/other");
    match client(&base).load_all().await.unwrap_err() {
        EditorError::Http { status, .. } => assert_eq!(status, reqwest::StatusCode::NOT_FOUND),
        other => panic!("unexpected: {other:?}"),
    }
}

// ── Session ──────────────────────────────────────────────────────────

#[tokio::test]
async fn session_edits_round_trip_through_server() {
    let (mock, base) = spawn_mock().await;
    let session = EditorSession::new(client(&base), EditorState::new().shared());
    session.load().await.unwrap();

    assert!(session.select("blacksmith"));
    let bindings = session.read(|s| s.selected_bindings());
    assert_eq!(bindings, vec![PromptBinding::friendly(Tier::Default, "brom_main")]);

    session.save_prompt("brom_main", "Sharper.").await.unwrap();
    session.rename("blacksmith", "Brom the Elder").await.unwrap();
    session
        .set_inventory(
            "blacksmith",
            vec![InventoryEntry::new("sword", 1), InventoryEntry::new("bread", 3)],
        )
        .await
        .unwrap();

    session.read(|s| {
        assert_eq!(s.prompt_text("brom_main"), Some("Sharper."));
        let npc = s.npc("blacksmith").unwrap();
        assert_eq!(npc.name.as_deref(), Some("Brom the Elder"));
        assert_eq!(npc.inventory().len(), 2);
        // Pass-through fields survive the merge.
        assert_eq!(npc.stat("friendly"), Some(30.0));
        assert!(!s.busy);
    });

    // A fresh load agrees with the locally merged state.
    let server = mock.lock().unwrap().data.clone();
    assert_eq!(server["npcs"]["blacksmith"]["name"], "Brom the Elder");
    assert_eq!(server["prompts"]["brom_main"], "Sharper.");
}

#[tokio::test]
async fn session_rejected_write_keeps_local_state() {
    let (mock, base) = spawn_mock().await;
    let session = EditorSession::new(client(&base), EditorState::new().shared());
    session.load().await.unwrap();

    set_mode(&mock, Mode::Reject("read only"));
    assert!(session.rename("innkeeper", "Gretchen").await.is_err());

    session.read(|s| {
        assert_eq!(
            s.npc("innkeeper").and_then(|n| n.name.as_deref()),
            Some("Greta")
        );
        let status = s.current_status(Instant::now()).unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "read only");
    });
}

#[tokio::test]
async fn session_create_selects_new_npc() {
    let (_mock, base) = spawn_mock().await;
    let session = EditorSession::new(client(&base), EditorState::new().shared());
    session.load().await.unwrap();

    session
        .create_npc(&NewNpc {
            npc_id: "herbalist".into(),
            name: "Mira".into(),
            prompt_type: PromptType::Tiered,
        })
        .await
        .unwrap();

    session.read(|s| {
        assert_eq!(s.selected.as_deref(), Some("herbalist"));
        let tiers: Vec<Tier> = s.selected_bindings().iter().map(|b| b.tier).collect();
        assert_eq!(tiers, vec![Tier::Bad, Tier::Normal, Tier::Good, Tier::Perfect]);
    });

    // Creating the same id again is refused by the server.
    let dup = session
        .create_npc(&NewNpc {
            npc_id: "herbalist".into(),
            name: "Other".into(),
            prompt_type: PromptType::Single,
        })
        .await;
    assert!(matches!(dup, Err(EditorError::Rejected(Some(_)))));
}

#[tokio::test]
async fn session_worker_applies_queued_commands() {
    let (_mock, base) = spawn_mock().await;
    let session = EditorSession::new(client(&base), EditorState::new().shared());
    let state = session.state().clone();
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let worker = tokio::spawn(session.run(rx));

    tx.send(EditorCommand::Reload).await.unwrap();
    tx.send(EditorCommand::Rename {
        npc_id: "innkeeper".into(),
        name: "Gretchen".into(),
    })
    .await
    .unwrap();
    drop(tx);
    worker.await.unwrap();

    let s = state.lock().unwrap();
    assert!(s.loaded);
    assert_eq!(
        s.npc("innkeeper").and_then(|n| n.name.as_deref()),
        Some("Gretchen")
    );
}
