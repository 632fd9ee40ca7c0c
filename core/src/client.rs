//! Stateless HTTP request builder and response parser for the parking API.
//!
//! # Design
//! `ParkingClient` holds only a base URL and the update payload encoding. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. Success is an exact
//! 200: any other status, 2xx included, fails the operation. A 200 body is
//! handed back as-is; a body that is not JSON comes back as `Value::String`.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Cause, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Credentials, FlatUpdate, NestedUpdate, ParamsEncoding, ParkingParams, SessionToken};

/// Production endpoint of the parking API.
pub const DEFAULT_BASE_URL: &str = "https://parking-api-ymux.onrender.com/api/";

/// Environment variable overriding the base URL in `ParkingClient::from_env`.
pub const BASE_URL_ENV: &str = "PARKING_API_URL";

/// Synchronous, stateless client for the parking API.
#[derive(Debug, Clone)]
pub struct ParkingClient {
    base_url: String,
    encoding: ParamsEncoding,
}

impl Default for ParkingClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ParkingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            encoding: ParamsEncoding::default(),
        }
    }

    /// Use `$PARKING_API_URL` when set, the production endpoint otherwise.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_params_encoding(mut self, encoding: ParamsEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn params_encoding(&self) -> ParamsEncoding {
        self.encoding
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_post(Operation::Login, credentials)
    }

    pub fn build_register(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_post(Operation::Register, credentials)
    }

    pub fn build_update_params(
        &self,
        token: &SessionToken,
        params: &ParkingParams,
    ) -> Result<HttpRequest, ApiError> {
        match self.encoding {
            ParamsEncoding::Flat => self.json_post(Operation::UpdateParams, &FlatUpdate { token, params }),
            ParamsEncoding::Nested => {
                self.json_post(Operation::UpdateParams, &NestedUpdate { token, params })
            }
        }
    }

    pub fn build_get_params(&self, token: &SessionToken) -> Result<HttpRequest, ApiError> {
        let op = Operation::GetParams;
        let mut url = reqwest::Url::parse(&self.url_for(op))
            .map_err(|e| op.fail(Cause::InvalidUrl(e.to_string())))?;
        url.query_pairs_mut().append_pair("token", token.as_str());
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_body(Operation::Login, response)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_body(Operation::Register, response)
    }

    pub fn parse_update_params(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_body(Operation::UpdateParams, response)
    }

    /// The stored parameters exactly as the server sent them. Use
    /// `ParkingParams::from_value` for the typed record.
    pub fn parse_get_params(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_body(Operation::GetParams, response)
    }

    fn url_for(&self, op: Operation) -> String {
        format!("{}/{}", self.base_url, op.path())
    }

    fn json_post<T: Serialize>(&self, op: Operation, payload: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| op.fail(Cause::Serialization(e)))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url_for(op),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Map anything but an exact 200 to the operation's error.
fn check_status(op: Operation, response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(op.fail(Cause::Status {
        status: response.status,
        body: response.body.clone(),
    }))
}

fn parse_body(op: Operation, response: HttpResponse) -> Result<Value, ApiError> {
    check_status(op, &response)?;
    Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)))
}
