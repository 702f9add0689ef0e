//! Shared response envelope types for API handlers.
//!
//! JSON responses that are not a bare entity use a `{ "data": ... }`
//! envelope. Use [`DataResponse`] instead of ad-hoc
//! `serde_json::json!({ "data": ... })`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: page }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
