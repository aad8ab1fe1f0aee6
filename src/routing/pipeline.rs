//! Route pipeline construction and per-request dispatch.
//!
//! Turns the declarative route table into registered axum handlers. Each
//! route gets an ordered chain: validator middleware (when the route
//! declares params), the named middlewares in declared order, then the
//! controller. The build is all-or-nothing; any error aborts startup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequestParts, Query, RawPathParams, Request};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{any, on, MethodFilter};
use axum::Router;
use serde_json::Value;
use thiserror::Error;

use crate::config::{AppConfig, RouteMethod};
use crate::http::AppState;
use crate::observability::metrics;
use crate::routing::registry::{Controller, HandlerRegistry, Middleware};
use crate::routing::system;
use crate::routing::RESERVED_PREFIX;
use crate::validate::{
    is_valid_type, test_params, to_lowercase_if_set, to_uppercase_if_set, ParamSchema,
    ValidationError,
};

/// Fatal route table errors, raised at build time before any request is
/// served.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("route '{0}' uses the reserved '{RESERVED_PREFIX}' prefix for system routes")]
    ReservedPath(String),

    #[error("route '{path}' references unknown controller '{name}'")]
    UnknownController { path: String, name: String },

    #[error("route '{path}' references unknown middleware '{name}'")]
    UnknownMiddleware { path: String, name: String },

    #[error("failed to read not-found page '{path}': {source}")]
    NotFoundPage {
        path: String,
        source: std::io::Error,
    },
}

/// Everything a controller or middleware sees for one request.
pub struct RequestContext {
    /// Shared application state (store handle, file storage, config).
    pub state: AppState,

    /// Captured path parameters.
    pub params: HashMap<String, String>,

    /// Parsed query string.
    pub query: HashMap<String, String>,

    /// Decoded JSON body; `{}` when the request carried none.
    pub body: Value,
}

/// One compiled route: the resolved middleware chain plus its controller.
struct RouteChain {
    path: String,
    middlewares: Vec<Arc<dyn Middleware>>,
    controller: Arc<dyn Controller>,
}

/// Validator middleware built from a route's param schema.
struct ParamValidator {
    schema: ParamSchema,
}

#[async_trait::async_trait]
impl Middleware for ParamValidator {
    async fn call(&self, ctx: &mut RequestContext) -> Result<(), Response> {
        if let Err(error) = test_params(&self.schema, &ctx.body) {
            return Err(Json(error.to_payload()).into_response());
        }

        // At most one type error is reported, but normalization still runs
        // for every remaining field before the chain is stopped.
        let mut type_error: Option<ValidationError> = None;

        if let Some(object) = ctx.body.as_object_mut() {
            for (field, value) in object.iter_mut() {
                let Some(spec) = self.schema.get(field) else {
                    continue;
                };

                if type_error.is_none() && !is_valid_type(value, spec) {
                    type_error = Some(ValidationError::WrongType {
                        field: field.clone(),
                        expected: spec.kind,
                    });
                }

                *value = to_lowercase_if_set(value, spec);
                *value = to_uppercase_if_set(value, spec);
            }
        }

        match type_error {
            Some(error) => Err(Json(error.to_payload()).into_response()),
            None => Ok(()),
        }
    }
}

/// Convert `:name` path segments to axum captures and a bare `*` to a
/// catch-all capture.
fn to_axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if segment == "*" {
                "{*rest}".to_string()
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn method_filter(method: RouteMethod) -> Option<MethodFilter> {
    match method {
        RouteMethod::Get => Some(MethodFilter::GET),
        RouteMethod::Put => Some(MethodFilter::PUT),
        RouteMethod::Post => Some(MethodFilter::POST),
        RouteMethod::Delete => Some(MethodFilter::DELETE),
        RouteMethod::All => None,
    }
}

/// Run one compiled chain against an incoming request.
async fn dispatch(chain: Arc<RouteChain>, state: AppState, request: Request) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let (mut parts, body) = request.into_parts();

    let params: HashMap<String, String> =
        match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(_) => HashMap::new(),
        };

    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    let limit = state.config.server.max_body_bytes;
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) if bytes.is_empty() => Value::Object(Default::default()),
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(path = %chain.path, error = %error, "malformed request body");
                let response = (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "malformed JSON body"})),
                )
                    .into_response();
                metrics::record_request(&method, response.status().as_u16(), &chain.path, start);
                return response;
            }
        },
        Err(_) => {
            let response = StatusCode::PAYLOAD_TOO_LARGE.into_response();
            metrics::record_request(&method, response.status().as_u16(), &chain.path, start);
            return response;
        }
    };

    let mut ctx = RequestContext {
        state,
        params,
        query,
        body,
    };

    for middleware in &chain.middlewares {
        if let Err(response) = middleware.call(&mut ctx).await {
            metrics::record_request(&method, response.status().as_u16(), &chain.path, start);
            return response;
        }
    }

    let response = chain.controller.handle(ctx).await;
    metrics::record_request(&method, response.status().as_u16(), &chain.path, start);
    response
}

/// Build the complete axum router: system endpoints, the declarative
/// table in order, then the not-found fallback.
pub fn build_router(
    config: &AppConfig,
    registry: &HandlerRegistry,
    state: AppState,
) -> Result<Router, BuildError> {
    let mut app = Router::new().merge(system::system_routes(state.clone()));

    for route in &config.routes {
        if route.path.starts_with(RESERVED_PREFIX) {
            return Err(BuildError::ReservedPath(route.path.clone()));
        }

        let controller =
            registry
                .controller(&route.controller)
                .ok_or_else(|| BuildError::UnknownController {
                    path: route.path.clone(),
                    name: route.controller.clone(),
                })?;

        let mut middlewares: Vec<Arc<dyn Middleware>> = Vec::new();
        if let Some(schema) = &route.params {
            middlewares.push(Arc::new(ParamValidator {
                schema: schema.clone(),
            }));
        }
        for name in &route.middlewares {
            let middleware =
                registry
                    .middleware(name)
                    .ok_or_else(|| BuildError::UnknownMiddleware {
                        path: route.path.clone(),
                        name: name.clone(),
                    })?;
            middlewares.push(middleware);
        }

        let chain = Arc::new(RouteChain {
            path: route.path.clone(),
            middlewares,
            controller,
        });
        let chain_state = state.clone();
        let handler = move |request: Request<Body>| {
            let chain = chain.clone();
            let state = chain_state.clone();
            async move { dispatch(chain, state, request).await }
        };

        let axum_path = to_axum_path(&route.path);
        let method_router = match method_filter(route.method) {
            Some(filter) => on(filter, handler),
            None => any(handler),
        };
        app = app.route(&axum_path, method_router);

        tracing::debug!(
            path = %route.path,
            controller = %route.controller,
            method = ?route.method,
            "route registered"
        );
    }

    let page_path = &config.server.not_found_page;
    let page = std::fs::read_to_string(page_path).map_err(|source| BuildError::NotFoundPage {
        path: page_path.clone(),
        source,
    })?;
    app = app.fallback(move |request: Request<Body>| {
        let page = page.clone();
        let method = request.method().to_string();
        let start = Instant::now();
        async move {
            let response = (StatusCode::NOT_FOUND, Html(page)).into_response();
            metrics::record_request(&method, 404, "unmatched", start);
            response
        }
    });

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parameters_are_converted() {
        assert_eq!(to_axum_path("/user/:id"), "/user/{id}");
        assert_eq!(to_axum_path("/a/:b/c/:d"), "/a/{b}/c/{d}");
        assert_eq!(to_axum_path("/files/*"), "/files/{*rest}");
        assert_eq!(to_axum_path("/plain"), "/plain");
    }

    #[test]
    fn all_maps_to_method_agnostic_registration() {
        assert!(method_filter(RouteMethod::All).is_none());
        assert_eq!(method_filter(RouteMethod::Get), Some(MethodFilter::GET));
    }
}
