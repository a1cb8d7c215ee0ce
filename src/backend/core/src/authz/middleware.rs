//! Axum enforcement middleware for class-level authorization checks.
//!
//! The middleware reads the [`CurrentActor`] extension (injected by the
//! session/authentication layer, which is outside this core) and runs a
//! class-level rule check through a fresh per-request [`Gateway`]. A denial
//! becomes a 403 JSON response; on success the gateway is stored in the
//! request extensions so handlers and views reuse its decision cache for
//! the rest of the request.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

use super::gateway::Gateway;
use super::registry::PolicyRegistry;
use crate::config::GatewaySettings;
use crate::domain::{Actor, ResourceType};

// ═══════════════════════════════════════════════════════════════════════════════
// CurrentActor
// ═══════════════════════════════════════════════════════════════════════════════

/// The authenticated actor for the request, as established by the session
/// layer. An absent extension or `None` inside it both mean anonymous.
#[derive(Debug, Clone, Default)]
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentActor>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Axum extractor for the per-request gateway installed by
/// [`RequireRuleLayer`].
#[derive(Clone)]
pub struct RequestGateway(pub Arc<Gateway>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestGateway
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestGateway>()
            .cloned()
            .ok_or_else(|| {
                let body = serde_json::json!({
                    "success": false,
                    "error": {
                        "code": "MISSING_GATEWAY",
                        "message": "Authorization gateway not available. Ensure RequireRuleLayer is applied.",
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer enforcing a class-level rule on every request it wraps.
///
/// # Example
///
/// ```rust,ignore
/// use passerelle_core::authz::{RequireRuleLayer, PolicyRegistry};
/// use passerelle_core::domain::ResourceType;
///
/// let registry = Arc::new(PolicyRegistry::build()?);
/// let app = Router::new()
///     .route("/reports", post(create_report))
///     .layer(RequireRuleLayer::new(registry, ResourceType::Report, "create"));
/// ```
#[derive(Clone)]
pub struct RequireRuleLayer {
    registry: Arc<PolicyRegistry>,
    settings: GatewaySettings,
    resource: ResourceType,
    rule: &'static str,
}

impl RequireRuleLayer {
    pub fn new(registry: Arc<PolicyRegistry>, resource: ResourceType, rule: &'static str) -> Self {
        Self {
            registry,
            settings: GatewaySettings::default(),
            resource,
            rule,
        }
    }

    pub fn with_settings(mut self, settings: GatewaySettings) -> Self {
        self.settings = settings;
        self
    }
}

impl<S> Layer<S> for RequireRuleLayer {
    type Service = RequireRuleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRuleService {
            inner,
            registry: self.registry.clone(),
            settings: self.settings.clone(),
            resource: self.resource,
            rule: self.rule,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Service that enforces the configured rule per request.
#[derive(Clone)]
pub struct RequireRuleService<S> {
    inner: S,
    registry: Arc<PolicyRegistry>,
    settings: GatewaySettings,
    resource: ResourceType,
    rule: &'static str,
}

impl<S> Service<Request<Body>> for RequireRuleService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let registry = self.registry.clone();
        let settings = self.settings.clone();
        let resource = self.resource;
        let rule = self.rule;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let current = request
                .extensions()
                .get::<CurrentActor>()
                .cloned()
                .unwrap_or_default();

            let gateway = Arc::new(Gateway::with_settings(registry, settings));

            if !gateway.authorize_type(current.actor(), resource, rule) {
                warn!(
                    actor = ?current.actor().map(|a| a.id.as_str()),
                    resource = %resource,
                    rule,
                    "request denied"
                );
                return Ok(forbidden_response(&format!(
                    "You are not allowed to {} {}",
                    rule, resource
                )));
            }

            // Downstream handlers reuse the same gateway (and its cache).
            request.extensions_mut().insert(RequestGateway(gateway));

            inner.call(request).await
        })
    }
}

/// Build a 403 Forbidden JSON response.
fn forbidden_response(message: &str) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": {
            "code": "FORBIDDEN",
            "message": message,
        }
    });
    (StatusCode::FORBIDDEN, Json(body)).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
