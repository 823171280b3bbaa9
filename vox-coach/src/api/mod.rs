//! HTTP API handlers for vox-coach

pub mod analyze;
pub mod health;
pub mod speech;
pub mod users;
pub mod warmup;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use speech::speech_routes;
pub use users::user_routes;
pub use warmup::warmup_routes;

use axum::extract::rejection::JsonRejection;

use crate::error::ApiError;

/// Map a JSON body rejection to an API error
///
/// Syntax, data and content-type problems are `INPUT_INVALID`. A body that
/// could not be buffered keeps axum's status (413 past the body limit).
pub(crate) fn invalid_body(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::BytesRejection(_) => ApiError::BodyRejected {
            status: rejection.status(),
            message: rejection.body_text(),
        },
        _ => ApiError::InputInvalid(rejection.body_text()),
    }
}
