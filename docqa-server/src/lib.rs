//! `docqa-server` exposes the answer pipeline over HTTP.
//!
//! Routes:
//! - `GET /` liveness message
//! - `GET /health` pipeline readiness and chunk count
//! - `POST /api/get_answer` answers `{"text": ...}` with `{"message": ...}`
//! - `GET /api/request_count` number of answer requests since startup

pub mod config;
pub mod counter;
pub mod error;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use counter::RequestCounter;
pub use error::ApiError;
pub use server::{AppState, app_router, build_pipeline, run_server};
