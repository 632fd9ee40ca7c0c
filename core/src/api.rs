//! Async facade: one network round-trip per parking API operation.
//!
//! `ParkingApi` glues `ParkingClient`'s build/parse halves to a `Transport`.
//! A call makes a single attempt; there is no retry, timeout or caching here.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use crate::client::ParkingClient;
use crate::error::{ApiError, BoxError, Cause, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Credentials, ParkingParams, SessionToken};

/// Executes an `HttpRequest` and hands back whatever the server answered.
///
/// Implementations must return non-2xx responses as `Ok`; status handling
/// belongs to `ParkingClient`. `Err` means no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// `Transport` backed by a shared `reqwest::Client` connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&request.url),
            HttpMethod::Post => self.http.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse::new(status, body))
    }
}

/// Async client for the parking API.
#[derive(Debug, Clone)]
pub struct ParkingApi<T = ReqwestTransport> {
    client: ParkingClient,
    transport: T,
}

impl ParkingApi<ReqwestTransport> {
    pub fn new(client: ParkingClient) -> Self {
        Self::with_transport(client, ReqwestTransport::default())
    }
}

impl Default for ParkingApi<ReqwestTransport> {
    fn default() -> Self {
        Self::new(ParkingClient::default())
    }
}

impl<T: Transport> ParkingApi<T> {
    pub fn with_transport(client: ParkingClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &ParkingClient {
        &self.client
    }

    /// `POST /login`. Returns the server's JSON body untouched.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        let result = async {
            let request = self.client.build_login(credentials)?;
            let response = self.round_trip(Operation::Login, request).await?;
            self.client.parse_login(response)
        }
        .await;
        log_auth_failure(result)
    }

    /// `POST /register`. Returns the server's JSON body untouched.
    pub async fn register(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        let result = async {
            let request = self.client.build_register(credentials)?;
            let response = self.round_trip(Operation::Register, request).await?;
            self.client.parse_register(response)
        }
        .await;
        log_auth_failure(result)
    }

    /// `POST /updateParams` using the client's `ParamsEncoding`.
    pub async fn update_parameters(
        &self,
        token: &SessionToken,
        params: &ParkingParams,
    ) -> Result<Value, ApiError> {
        let request = self.client.build_update_params(token, params)?;
        let response = self.round_trip(Operation::UpdateParams, request).await?;
        self.client.parse_update_params(response)
    }

    /// `GET /getParams?token=..`. Returns the server's JSON body untouched;
    /// decode it with `ParkingParams::from_value`.
    pub async fn fetch_parameters(&self, token: &SessionToken) -> Result<Value, ApiError> {
        let request = self.client.build_get_params(token)?;
        let response = self.round_trip(Operation::GetParams, request).await?;
        self.client.parse_get_params(response)
    }

    async fn round_trip(&self, op: Operation, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "parking api request");
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| op.fail(Cause::Transport(e)))?;
        debug!(status = response.status, operation = ?op, "parking api response");
        Ok(response)
    }
}

fn log_auth_failure<V>(result: Result<V, ApiError>) -> Result<V, ApiError> {
    if let Err(err) = &result {
        error!(operation = ?err.operation(), cause = %err.cause(), "{err}");
    }
    result
}
