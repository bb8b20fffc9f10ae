pub mod auth;
pub mod error;
pub mod method_override;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod security;
pub mod session;
pub mod state;
pub mod views;

pub use error::AppError;
pub use pipeline::{PipelineBuilder, PipelineError, Stage, build_app};
pub use state::{AppState, AppStateInner};
