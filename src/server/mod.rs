//! Reference attendance service.
//!
//! An in-memory implementation of the attendance HTTP contract, used for
//! local development and as the counterpart of the integration tests.

mod handlers;
mod response;
mod state;
mod store;

pub use handlers::{AttendanceQuery, create_router};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
pub use store::AttendanceStore;
