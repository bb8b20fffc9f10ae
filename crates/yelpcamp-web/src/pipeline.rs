//! Request pipeline with its stage order checked at composition time.
//!
//! Execution order, outermost first:
//!
//! ```text
//! security headers -> error normalizer -> [static files] | method override
//!     -> session -> identity -> locals -> error normalizer
//!     -> routes | not found
//! ```
//!
//! The error normalizer is declared last but wraps the route handlers, so it
//! is the last stage to see every response before locals and session. A
//! second instance wraps static files and method override, which answer
//! outside the session and render the error view without locals.

use std::fmt;
use std::sync::Arc;

use axum::{Router, middleware};
use thiserror::Error;
use tower::Layer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error;
use crate::method_override::method_override;
use crate::middleware::{identity_stage, locals_stage, session_stage};
use crate::routes;
use crate::security::{SecurityPolicy, security_headers};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SecurityHeaders,
    MethodOverride,
    Session,
    Identity,
    Locals,
    Routes,
    NotFound,
    ErrorNormalizer,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::SecurityHeaders,
        Stage::MethodOverride,
        Stage::Session,
        Stage::Identity,
        Stage::Locals,
        Stage::Routes,
        Stage::NotFound,
        Stage::ErrorNormalizer,
    ];

    /// Stages that must already be in the pipeline before this one.
    pub fn prerequisites(self) -> &'static [Stage] {
        match self {
            Stage::SecurityHeaders => &[],
            Stage::MethodOverride => &[Stage::SecurityHeaders],
            Stage::Session => &[Stage::SecurityHeaders, Stage::MethodOverride],
            Stage::Identity => &[Stage::Session],
            Stage::Locals => &[Stage::Identity],
            Stage::Routes => &[Stage::Identity, Stage::Locals],
            Stage::NotFound => &[Stage::Routes],
            Stage::ErrorNormalizer => &[Stage::NotFound],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("stage {stage} requires {missing} to be added first")]
    MissingPrerequisite { stage: Stage, missing: Stage },

    #[error("stage {0} added twice")]
    Duplicate(Stage),

    #[error("pipeline is missing stage {0}")]
    Incomplete(Stage),
}

pub struct PipelineBuilder {
    state: AppState,
    stages: Vec<Stage>,
    policy: Option<SecurityPolicy>,
    routes: Option<Router<AppState>>,
}

impl PipelineBuilder {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            stages: Vec::with_capacity(Stage::ALL.len()),
            policy: None,
            routes: None,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn push(mut self, stage: Stage) -> Result<Self, PipelineError> {
        if self.stages.contains(&stage) {
            return Err(PipelineError::Duplicate(stage));
        }
        if let Some(&missing) = stage
            .prerequisites()
            .iter()
            .find(|p| !self.stages.contains(p))
        {
            return Err(PipelineError::MissingPrerequisite { stage, missing });
        }
        self.stages.push(stage);
        Ok(self)
    }

    pub fn security_headers(self, policy: SecurityPolicy) -> Result<Self, PipelineError> {
        let mut this = self.push(Stage::SecurityHeaders)?;
        this.policy = Some(policy);
        Ok(this)
    }

    pub fn method_override(self) -> Result<Self, PipelineError> {
        self.push(Stage::MethodOverride)
    }

    pub fn session(self) -> Result<Self, PipelineError> {
        self.push(Stage::Session)
    }

    pub fn identity(self) -> Result<Self, PipelineError> {
        self.push(Stage::Identity)
    }

    pub fn locals(self) -> Result<Self, PipelineError> {
        self.push(Stage::Locals)
    }

    pub fn routes(self, routes: Router<AppState>) -> Result<Self, PipelineError> {
        let mut this = self.push(Stage::Routes)?;
        this.routes = Some(routes);
        Ok(this)
    }

    pub fn not_found(self) -> Result<Self, PipelineError> {
        self.push(Stage::NotFound)
    }

    pub fn error_normalizer(self) -> Result<Self, PipelineError> {
        self.push(Stage::ErrorNormalizer)
    }

    pub fn build(self) -> Result<Router, PipelineError> {
        if let Some(&missing) = Stage::ALL.iter().find(|s| !self.stages.contains(s)) {
            return Err(PipelineError::Incomplete(missing));
        }
        let (Some(policy), Some(routes)) = (self.policy, self.routes) else {
            return Err(PipelineError::Incomplete(Stage::SecurityHeaders));
        };
        let state = self.state;

        // Layers added later run earlier, so they are listed innermost first.
        let dispatch = routes
            .fallback(error::not_found)
            .layer(middleware::from_fn(error::normalize_errors))
            .layer(middleware::from_fn(locals_stage))
            .layer(middleware::from_fn_with_state(state.clone(), identity_stage))
            .layer(middleware::from_fn_with_state(state.clone(), session_stage))
            .with_state(state.clone());

        // Method override must run before routing, so it wraps the router as
        // a service instead of being a route layer.
        let overridden = middleware::from_fn(method_override).layer(dispatch);

        Ok(Router::new()
            .nest_service("/static", ServeDir::new(&state.static_dir))
            .fallback_service(overridden)
            .layer(middleware::from_fn(error::normalize_errors))
            .layer(middleware::from_fn_with_state(Arc::new(policy), security_headers))
            .layer(TraceLayer::new_for_http()))
    }
}

/// The standard pipeline over the application's route groups.
pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let policy = SecurityPolicy::standard()?;
    let app = PipelineBuilder::new(state)
        .security_headers(policy)?
        .method_override()?
        .session()?
        .identity()?
        .locals()?
        .routes(routes::router())?
        .not_found()?
        .error_normalizer()?
        .build()?;
    Ok(app)
}
