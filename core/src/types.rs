//! Domain DTOs for the parking API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift. Field names on the wire are the
//! server's (`hauteur`, `pmr`, `dspOnly`, `electrique`), Rust names are not.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Login / register payload. Never stored by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Opaque session token handed out by the server on login/register.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// A user's parking preferences.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ParkingParams {
    /// Vehicle height limit. Whole numbers go on the wire as integers.
    #[serde(rename = "hauteur", serialize_with = "serialize_height")]
    pub height: f64,
    /// Reduced-mobility access required.
    #[serde(rename = "pmr")]
    pub reduced_mobility: bool,
    /// Only list disabled-badge spots.
    #[serde(rename = "dspOnly")]
    pub disabled_only: bool,
    /// Needs an EV charging point.
    #[serde(rename = "electrique")]
    pub electric: bool,
}

impl ParkingParams {
    /// Decode a `getParams` body, flat or wrapped in `{"params": {..}}`.
    /// Fields the record does not know about are ignored.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let record = match value.get("params") {
            Some(inner) if inner.is_object() => inner,
            _ => value,
        };
        Self::deserialize(record)
    }
}

fn serialize_height<S: Serializer>(height: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if height.fract() == 0.0 && height.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*height as i64)
    } else {
        serializer.serialize_f64(*height)
    }
}

/// How `updateParams` carries the parameters.
///
/// Two incompatible payload shapes exist for the same endpoint; which one a
/// given server accepts is a deployment decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParamsEncoding {
    /// `{token, hauteur, pmr, dspOnly, electrique}`
    #[default]
    Flat,
    /// `{token, params: {hauteur, pmr, dspOnly, electrique}}`
    Nested,
}

#[derive(Serialize)]
pub(crate) struct FlatUpdate<'a> {
    pub token: &'a SessionToken,
    #[serde(flatten)]
    pub params: &'a ParkingParams,
}

#[derive(Serialize)]
pub(crate) struct NestedUpdate<'a> {
    pub token: &'a SessionToken,
    pub params: &'a ParkingParams,
}
