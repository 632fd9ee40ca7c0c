use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub hauteur: f64,
    pub pmr: bool,
    #[serde(rename = "dspOnly")]
    pub dsp_only: bool,
    pub electrique: bool,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Both payload shapes seen in the wild for `updateParams`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum UpdateParams {
    Nested { token: String, params: Params },
    Flat {
        token: String,
        #[serde(flatten)]
        params: Params,
    },
}

impl UpdateParams {
    fn into_parts(self) -> (String, Params) {
        match self {
            UpdateParams::Nested { token, params } | UpdateParams::Flat { token, params } => {
                (token, params)
            }
        }
    }
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Clone, Debug)]
struct User {
    password: String,
    params: Params,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    /// token -> username
    sessions: HashMap<String, String>,
}

pub type Db = Arc<RwLock<Store>>;

type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/updateParams", post(update_params))
        .route("/api/getParams", get(get_params))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "error": message })))
}

fn issue_token(store: &mut Store, username: &str) -> String {
    let token = Uuid::new_v4().to_string();
    store.sessions.insert(token.clone(), username.to_string());
    token
}

async fn register(State(db): State<Db>, Json(input): Json<Credentials>) -> Reply {
    let mut store = db.write().await;
    if store.users.contains_key(&input.username) {
        tracing::warn!(username = %input.username, "register: username taken");
        return error(StatusCode::CONFLICT, "username already exists");
    }
    store.users.insert(
        input.username.clone(),
        User {
            password: input.password,
            params: Params::default(),
        },
    );
    let token = issue_token(&mut store, &input.username);
    tracing::info!(username = %input.username, "registered");
    (
        StatusCode::OK,
        Json(json!({ "token": token, "username": input.username })),
    )
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> Reply {
    let mut store = db.write().await;
    let valid = store
        .users
        .get(&input.username)
        .is_some_and(|user| user.password == input.password);
    if !valid {
        tracing::warn!(username = %input.username, "login: invalid credentials");
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }
    let token = issue_token(&mut store, &input.username);
    tracing::info!(username = %input.username, "logged in");
    (
        StatusCode::OK,
        Json(json!({ "token": token, "username": input.username })),
    )
}

async fn update_params(State(db): State<Db>, Json(input): Json<UpdateParams>) -> Reply {
    let (token, params) = input.into_parts();
    let mut store = db.write().await;
    let Some(username) = store.sessions.get(&token).cloned() else {
        return error(StatusCode::UNAUTHORIZED, "invalid token");
    };
    let Some(user) = store.users.get_mut(&username) else {
        return error(StatusCode::UNAUTHORIZED, "invalid token");
    };
    user.params = params;
    tracing::info!(%username, "params updated");
    (
        StatusCode::OK,
        Json(json!({ "message": "params updated", "params": params })),
    )
}

async fn get_params(
    State(db): State<Db>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Params>, Reply> {
    let store = db.read().await;
    store
        .sessions
        .get(&query.token)
        .and_then(|username| store.users.get(username))
        .map(|user| Json(user.params))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid token"))
}
