//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. CORS
//! 3. `TraceLayer` (request span)
//! 4. Request ID (recorded into the span)
//! 5. Rate limiting (only on `/api` routes, via `route_layer`)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{client_ip, rate_limit_middleware};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
