//! Name → handler resolution.
//!
//! The route table references controllers and middlewares by name. The
//! registry maps those names to concrete trait objects, populated at
//! startup by the embedding application. Resolution failures surface as
//! build errors in the pipeline, before any request is served.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use crate::routing::pipeline::RequestContext;

/// A named request handler: consumes the prepared context, produces the
/// response.
#[async_trait]
pub trait Controller: Send + Sync {
    async fn handle(&self, ctx: RequestContext) -> Response;
}

/// A named middleware stage. `Err(response)` short-circuits the chain and
/// sends that response; `Ok(())` passes the (possibly mutated) context on.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn call(&self, ctx: &mut RequestContext) -> Result<(), Response>;
}

struct FnController<F>(F);

#[async_trait]
impl<F, Fut> Controller for FnController<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send,
{
    async fn handle(&self, ctx: RequestContext) -> Response {
        (self.0)(ctx).await
    }
}

/// Registry of named controllers and middlewares.
#[derive(Default)]
pub struct HandlerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
    middlewares: HashMap<String, Arc<dyn Middleware>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_controller(
        &mut self,
        name: impl Into<String>,
        controller: impl Controller + 'static,
    ) {
        self.controllers.insert(name.into(), Arc::new(controller));
    }

    /// Register an async closure as a controller.
    pub fn register_controller_fn<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.register_controller(name, FnController(f));
    }

    pub fn register_middleware(
        &mut self,
        name: impl Into<String>,
        middleware: impl Middleware + 'static,
    ) {
        self.middlewares.insert(name.into(), Arc::new(middleware));
    }

    pub fn controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers.get(name).cloned()
    }

    pub fn middleware(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        self.middlewares.get(name).cloned()
    }
}
