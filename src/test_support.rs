//! A stand-in voting backend and camera for tests.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use image::{Rgb, RgbImage};
use serde_json::{json, Value};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    api::{voter_id_hash, ApiClient, CHAIN_PATH, LOGIN_PATH, UPLOAD_PATH, VOTE_PATH},
    camera::{CameraError, MediaDevices, VideoConstraints, VideoStream},
    model::{Credentials, VoteRequest},
    session::{AuthManager, MemoryStore},
};

const VALID_TOKEN: &str = "tok1";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Endpoint {
    Login,
    Upload,
    Vote,
    Verify,
    Chain,
}

/// A canned response that overrides the backend's normal behaviour once.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: Option<Value>,
}

impl Reply {
    pub fn status(code: u16) -> Self {
        Self {
            status: StatusCode::from_u16(code).unwrap(),
            body: None,
        }
    }

    pub fn json(code: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(code).unwrap(),
            body: Some(body),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// What the backend saw of an identity photo upload.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub authorization: Option<String>,
    pub image: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub timestamp: String,
}

#[derive(Default)]
struct MockState {
    calls: HashMap<Endpoint, usize>,
    scripts: HashMap<Endpoint, VecDeque<Reply>>,
    last_upload: Option<RecordedUpload>,
    last_vote: Option<VoteRequest>,
}

impl MockState {
    /// Count a call and pop any scripted reply for it.
    fn hit(&mut self, endpoint: Endpoint) -> Option<Reply> {
        *self.calls.entry(endpoint).or_default() += 1;
        self.scripts.get_mut(&endpoint).and_then(VecDeque::pop_front)
    }
}

type Shared = Arc<Mutex<MockState>>;

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        == Some(VALID_TOKEN)
}

fn invalid_session() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Invalid session" })),
    )
        .into_response()
}

async fn login(State(state): State<Shared>, Json(credentials): Json<Credentials>) -> Response {
    if let Some(reply) = state.lock().unwrap().hit(Endpoint::Login) {
        return reply.into_response();
    }

    if credentials == Credentials::example() {
        Json(json!({
            "success": true,
            "session_token": VALID_TOKEN,
            "voter_info": { "name": "Ada Voter", "constituency": "North" },
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Invalid voter credentials" })),
        )
            .into_response()
    }
}

async fn upload(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    // Read the whole body before deciding anything.
    let mut image = None;
    let mut timestamp = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("kyc_image") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.unwrap().to_vec();
                image = Some((bytes, file_name, content_type));
            }
            Some("timestamp") => timestamp = field.text().await.unwrap(),
            _ => {}
        }
    }

    let mut state = state.lock().unwrap();
    if let Some(reply) = state.hit(Endpoint::Upload) {
        return reply.into_response();
    }
    if !bearer_ok(&headers) {
        return invalid_session();
    }
    let Some((image, file_name, content_type)) = image else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No image provided" })),
        )
            .into_response();
    };

    state.last_upload = Some(RecordedUpload {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        image,
        file_name,
        content_type,
        timestamp,
    });
    Json(json!({
        "success": true,
        "image_hash": "h1",
        "encrypted_reference": "r1",
    }))
    .into_response()
}

async fn vote(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(vote): Json<VoteRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(reply) = state.hit(Endpoint::Vote) {
        return reply.into_response();
    }
    if !bearer_ok(&headers) {
        return invalid_session();
    }

    state.last_vote = Some(vote);
    Json(json!({
        "success": true,
        "receipt": { "block_index": 1, "vote_hash": "v1" },
    }))
    .into_response()
}

async fn verify(State(state): State<Shared>, Path(hash): Path<String>) -> Response {
    if let Some(reply) = state.lock().unwrap().hit(Endpoint::Verify) {
        return reply.into_response();
    }

    if hash == voter_id_hash(&Credentials::example().voter_id) {
        Json(json!({
            "verified": true,
            "proof": {
                "block_index": 1,
                "block_hash": "b1",
                "timestamp": "2024-05-01T09:30:00",
                "vote_hash": "v1",
            },
        }))
        .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "verified": false, "error": "Vote not found" })),
        )
            .into_response()
    }
}

async fn chain(State(state): State<Shared>) -> Response {
    if let Some(reply) = state.lock().unwrap().hit(Endpoint::Chain) {
        return reply.into_response();
    }

    Json(json!({ "valid": true, "total_blocks": 2, "error_at_block": null })).into_response()
}

/// An in-process voting backend listening on an ephemeral local port.
///
/// Knows one voter, `Credentials::example()`, whose session token is `tok1`.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = Router::new()
            .route(LOGIN_PATH, post(login))
            .route(UPLOAD_PATH, post(upload))
            .route(VOTE_PATH, post(vote))
            .route("/api/verify/:voter_id_hash", get(verify))
            .route(CHAIN_PATH, get(chain))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown: Some(tx),
            server: Some(server),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.url())
    }

    /// A signed-out auth manager with a fresh in-memory store.
    pub fn auth_manager(&self) -> AuthManager {
        AuthManager::new(self.api(), Arc::new(MemoryStore::default()))
    }

    /// An auth manager already signed in as the example voter.
    pub async fn logged_in(&self) -> AuthManager {
        let mut auth = self.auth_manager();
        auth.login(&Credentials::example()).await.unwrap();
        auth
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&endpoint)
            .copied()
            .unwrap_or_default()
    }

    fn script(&self, endpoint: Endpoint, reply: Reply) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .entry(endpoint)
            .or_default()
            .push_back(reply);
    }

    pub fn script_login(&self, reply: Reply) {
        self.script(Endpoint::Login, reply);
    }

    pub fn script_upload(&self, reply: Reply) {
        self.script(Endpoint::Upload, reply);
    }

    pub fn script_vote(&self, reply: Reply) {
        self.script(Endpoint::Vote, reply);
    }

    pub fn script_chain(&self, reply: Reply) {
        self.script(Endpoint::Chain, reply);
    }

    pub fn last_upload(&self) -> Option<RecordedUpload> {
        self.state.lock().unwrap().last_upload.clone()
    }

    pub fn last_vote(&self) -> Option<VoteRequest> {
        self.state.lock().unwrap().last_vote.clone()
    }

    /// Stop serving. Later requests fail at the transport level.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.await.unwrap();
        }
    }
}

/// A camera that produces a synthetic gradient, counts how often access is
/// granted, and exposes whether its stream is still live. Clones share state.
#[derive(Clone)]
pub struct FakeCamera {
    deny: bool,
    resolution: (u32, u32),
    grants: Arc<AtomicUsize>,
    live: Arc<AtomicBool>,
    last_constraints: Arc<Mutex<Option<VideoConstraints>>>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self::with_resolution(320, 240)
    }

    pub fn with_resolution(width: u32, height: u32) -> Self {
        Self {
            deny: false,
            resolution: (width, height),
            grants: Arc::default(),
            live: Arc::default(),
            last_constraints: Arc::default(),
        }
    }

    /// A camera the voter refuses permission for.
    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::new()
        }
    }

    pub fn grants(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<VideoConstraints> {
        self.last_constraints.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for FakeCamera {
    async fn get_user_media(
        &mut self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        *self.last_constraints.lock().unwrap() = Some(constraints.clone());
        if self.deny {
            return Err(CameraError::PermissionDenied);
        }
        self.grants.fetch_add(1, Ordering::SeqCst);
        self.live.store(true, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            resolution: self.resolution,
            live: Arc::clone(&self.live),
        }))
    }
}

struct FakeStream {
    resolution: (u32, u32),
    live: Arc<AtomicBool>,
}

impl VideoStream for FakeStream {
    fn snapshot(&mut self) -> Result<RgbImage, CameraError> {
        if !self.is_active() {
            return Err(CameraError::Stopped);
        }
        let (width, height) = self.resolution;
        Ok(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}
