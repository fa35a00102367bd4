use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use meeting_scheduler_lib::gateway::CreateMeetingRequest;
use meeting_scheduler_lib::{
    ApiClient, Availability, GatewayError, MeetingStore, NewMeeting, Operation, Participant,
    ParticipantAck, RetryPolicy,
};

// ── In-process scheduling service ───────────────────────────────────────────

const PARTICIPANT_LIMIT: usize = 15;

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Default)]
struct FakeService {
    meetings: Mutex<HashMap<String, Value>>,
    /// Number of upcoming `GET /meetings/{id}` calls that answer 503.
    flaky_gets: AtomicU32,
    gets: AtomicU32,
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Meeting not found" })),
    )
}

async fn create_meeting(State(svc): State<Arc<FakeService>>, Json(body): Json<Value>) -> Reply {
    if body.get("start_time").is_none() || body.get("end_time").is_none() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "start_time"], "msg": "field required" }] })),
        ));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let mut meeting = body;
    meeting["id"] = json!(id);
    meeting["participants"] = json!([]);
    svc.meetings.lock().unwrap().insert(id, meeting.clone());
    Ok(Json(meeting))
}

async fn get_meeting(State(svc): State<Arc<FakeService>>, Path(id): Path<String>) -> Reply {
    svc.gets.fetch_add(1, Ordering::SeqCst);
    let flaky = svc
        .flaky_gets
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if flaky {
        return Err((StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))));
    }

    svc.meetings
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn add_participant(
    State(svc): State<Arc<FakeService>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut meetings = svc.meetings.lock().unwrap();
    let meeting = meetings.get_mut(&id).ok_or_else(not_found)?;
    let participants = meeting["participants"]
        .as_array_mut()
        .expect("participants array");
    if participants.len() >= PARTICIPANT_LIMIT {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Participant limit reached" })),
        ));
    }
    participants.push(body);
    Ok(Json(json!({ "status": "success" })))
}

async fn list_participants(State(svc): State<Arc<FakeService>>, Path(id): Path<String>) -> Reply {
    let meetings = svc.meetings.lock().unwrap();
    let meeting = meetings.get(&id).ok_or_else(not_found)?;
    Ok(Json(json!({ "participants": meeting["participants"] })))
}

fn scheduling_service(svc: Arc<FakeService>) -> Router {
    Router::new()
        .route("/meetings", post(create_meeting))
        .route("/meetings/{id}", get(get_meeting))
        .route(
            "/meetings/{id}/participants",
            post(add_participant).get(list_participants),
        )
        .with_state(svc)
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start() -> (Arc<FakeService>, ApiClient) {
    let svc = Arc::new(FakeService::default());
    let url = serve(scheduling_service(Arc::clone(&svc))).await;
    (svc, ApiClient::new(&url).unwrap())
}

fn proposal() -> NewMeeting {
    NewMeeting {
        name: "Quarterly planning".to_string(),
        organizer: "Emi".to_string(),
        dates: vec![
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
        ],
        start_time: "13:00".parse().unwrap(),
        end_time: "15:00".parse().unwrap(),
    }
}

// ── ApiClient ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_fetch() {
    let (_svc, api) = start().await;

    let created = api
        .create_meeting(&CreateMeetingRequest::stamped(&proposal()))
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&created.id).is_ok());
    assert_eq!(created.name, "Quarterly planning");

    let fetched = api.get_meeting(&created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.dates, proposal().dates);
    assert_eq!(fetched.start_time.to_string(), "13:00");
    assert_eq!(fetched.end_time.to_string(), "15:00");
    assert!(fetched.participants.is_empty());
}

#[tokio::test]
async fn test_unknown_meeting_is_permanent_not_found() {
    let (_svc, api) = start().await;

    let err = api.get_meeting("does-not-exist").await.unwrap_err();

    match &err {
        GatewayError::Api { status, detail } => {
            assert_eq!(*status, 404);
            assert_eq!(detail.as_deref(), Some("Meeting not found"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_add_and_list_participants() {
    let (_svc, api) = start().await;
    let created = api
        .create_meeting(&CreateMeetingRequest::stamped(&proposal()))
        .await
        .unwrap();

    let participant = Participant::new("Taro")
        .with_comment("remote")
        .answer("2024-06-03-13:00", Availability::Available)
        .answer("2024-06-04-14:30", Availability::Unavailable);
    let ack = api.add_participant(&created.id, &participant).await.unwrap();
    assert_eq!(ack, ParticipantAck::Accepted);

    let listed = api.list_participants(&created.id).await.unwrap();
    assert_eq!(listed, vec![participant]);
}

#[tokio::test]
async fn test_id_only_creation_reply() {
    let app = Router::new().route(
        "/meetings",
        post(|| async { Json(json!({ "meeting_id": "short-1", "join_url": "/meetings/short-1" })) }),
    );
    let api = ApiClient::new(&serve(app).await).unwrap();

    let created = api
        .create_meeting(&CreateMeetingRequest::stamped(&proposal()))
        .await
        .unwrap();

    assert_eq!(created.id, "short-1");
    assert_eq!(created.organizer, "Emi");
    assert_eq!(created.dates.len(), 2);
    assert_eq!(created.share_path(), "/meetings/short-1");
}

#[tokio::test]
async fn test_malformed_reply_is_decode_error() {
    let app = Router::new().route("/meetings/{id}", get(|| async { "definitely not json" }));
    let api = ApiClient::new(&serve(app).await).unwrap();

    let err = api.get_meeting("x").await.unwrap_err();

    assert!(matches!(err, GatewayError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_service_is_transient() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let api = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let err = api.get_meeting("x").await.unwrap_err();

    assert!(matches!(err, GatewayError::Network(_)), "got {:?}", err);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_error_status_wins_over_truncated_body() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        // Promise more body than is sent, then hang up.
        let _ = socket
            .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 200\r\n\r\n{\"detail\": \"Meet")
            .await;
        let _ = socket.shutdown().await;
    });
    let api = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let err = api.get_meeting("gone").await.unwrap_err();

    assert!(
        matches!(err, GatewayError::Api { status: 404, detail: None }),
        "got {:?}",
        err
    );
    assert!(!err.is_transient());
}

// ── Store over HTTP ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_store_full_flow() {
    let (svc, api) = start().await;
    let organizer = MeetingStore::new(api.clone());
    let created = organizer.create_meeting(proposal()).await.unwrap();
    assert_eq!(organizer.slots().len(), 2 * 2 * 2);

    let guest = MeetingStore::new(api);
    guest.get_meeting(&created.id).await.unwrap();
    let first_slot = guest.slots()[0].key.clone();
    assert_eq!(first_slot, "2024-06-03-13:00");

    guest
        .add_participant(
            &created.id,
            Participant::new("Hiro").answer(first_slot.clone(), Availability::Available),
        )
        .await
        .unwrap();
    assert_eq!(guest.participants().len(), 1);

    let seen = organizer.refresh_participants(&created.id).await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].availability[&first_slot], Availability::Available);
    assert_eq!(organizer.participants().len(), 1);

    assert_eq!(svc.meetings.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_store_retries_unavailable_service() {
    let (svc, api) = start().await;
    let created = api
        .create_meeting(&CreateMeetingRequest::stamped(&proposal()))
        .await
        .unwrap();
    svc.flaky_gets.store(2, Ordering::SeqCst);

    let store = MeetingStore::new(api).with_retry(RetryPolicy::new(3, Duration::ZERO));
    store.get_meeting(&created.id).await.unwrap();

    assert_eq!(svc.gets.load(Ordering::SeqCst), 3);
    assert!(store.error(Operation::FetchMeeting).is_none());
    assert_eq!(store.current_meeting().unwrap().id, created.id);
}

#[tokio::test]
async fn test_store_surfaces_participant_limit() {
    let (svc, api) = start().await;
    let store = MeetingStore::new(api);
    let created = store.create_meeting(proposal()).await.unwrap();
    {
        let mut meetings = svc.meetings.lock().unwrap();
        let full: Vec<Value> = (0..PARTICIPANT_LIMIT)
            .map(|i| json!({ "name": format!("p{}", i), "availability": {} }))
            .collect();
        meetings.get_mut(&created.id).unwrap()["participants"] = json!(full);
    }

    let err = store
        .add_participant(&created.id, Participant::new("Late"))
        .await
        .unwrap_err();

    assert_eq!(err.message, "Participant limit reached");
    assert_eq!(
        store.error(Operation::AddParticipant).as_deref(),
        Some("Participant limit reached")
    );
    assert!(!store.is_loading());
}
