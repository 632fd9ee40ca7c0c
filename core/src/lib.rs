//! Client core for the parking-management API, plus the routing overlay store.
//!
//! # Overview
//! `ParkingClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern). `ParkingApi`
//! runs the round-trip through a `Transport`, `reqwest` by default.
//!
//! # Design
//! - `ParkingClient` is stateless: base URL plus update payload encoding.
//! - Every operation fails with one fixed-message `ApiError` variant; the
//!   underlying `Cause` stays available through `Error::source`.
//! - Success is an exact HTTP 200. One attempt per call, no caching.
//! - `RoutingStore` is an explicitly shared, observable value rather than a
//!   global; hand clones of it to whatever needs it.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod routing;
pub mod types;

pub use api::{ParkingApi, ReqwestTransport, Transport};
pub use client::{ParkingClient, BASE_URL_ENV, DEFAULT_BASE_URL};
pub use error::{ApiError, BoxError, Cause, Operation};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use routing::{LngLat, RoutingState, RoutingStore, Subscription};
pub use types::{Credentials, ParamsEncoding, ParkingParams, SessionToken};
