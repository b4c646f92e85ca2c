//! Route registration on top of axum.
//!
//! [`Registrar`] collects `(method, pattern, handler)` registrations,
//! including group-prefixed ones and explicit placeholders, checks them
//! and turns them into an [`axum::Router`]. Path matching and precedence
//! stay with axum.

pub mod pattern;

use axum::{
    handler::Handler,
    http::Method,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use tracing::{debug, warn};

use crate::api::handlers::unimplemented_route;
use crate::error::RouteError;

use self::pattern::{join_paths, parse_pattern};

/// What a registered route does when it is matched.
pub enum Endpoint<S> {
    /// A real handler.
    Handler {
        /// Handler type name, shown in the route table.
        name: &'static str,
        /// Single-method axum router wrapping the handler.
        method_router: MethodRouter<S>,
    },
    /// Declared without behavior; answers 501 when matched.
    Unimplemented,
}

impl<S> Endpoint<S> {
    fn name(&self) -> &'static str {
        match self {
            Self::Handler { name, .. } => *name,
            Self::Unimplemented => "<unimplemented>",
        }
    }
}

/// A single registration.
pub struct Route<S> {
    /// HTTP method.
    pub method: Method,
    /// Full path pattern, group prefix included.
    pub pattern: String,
    /// Behavior on match.
    pub endpoint: Endpoint<S>,
}

struct Group {
    prefix: String,
    routes: usize,
}

/// Collects routes and builds them into an axum router.
pub struct Registrar<S = ()> {
    routes: Vec<Route<S>>,
    groups: Vec<Group>,
}

impl<S> Default for Registrar<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Registrar<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create an empty registrar.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Register a GET handler.
    pub fn get<H, T>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.handler(Method::GET, pattern, handler)
    }

    /// Register a POST handler.
    pub fn post<H, T>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.handler(Method::POST, pattern, handler)
    }

    /// Register a handler for any method.
    pub fn handler<H, T>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let endpoint = match method_filter(&method) {
            Some(filter) => Endpoint::Handler {
                name: std::any::type_name::<H>(),
                method_router: on(filter, handler),
            },
            None => {
                warn!(%method, pattern, "unsupported method, registering as unimplemented");
                Endpoint::Unimplemented
            }
        };
        self.push(method, pattern.to_string(), endpoint)
    }

    /// Declare a route that has no behavior yet.
    pub fn unimplemented(&mut self, method: Method, pattern: &str) -> &mut Self {
        self.push(method, pattern.to_string(), Endpoint::Unimplemented)
    }

    /// Open a group; its registrations are prefixed with `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_, S> {
        self.groups.push(Group {
            prefix: prefix.to_string(),
            routes: 0,
        });
        let index = self.groups.len() - 1;
        RouteGroup {
            registrar: self,
            prefix: prefix.to_string(),
            lineage: vec![index],
        }
    }

    /// Registered routes, in registration order.
    pub fn routes(&self) -> &[Route<S>] {
        &self.routes
    }

    fn push(&mut self, method: Method, pattern: String, endpoint: Endpoint<S>) -> &mut Self {
        self.routes.push(Route {
            method,
            pattern,
            endpoint,
        });
        self
    }

    /// Check every registration and build the axum router.
    ///
    /// Fails on malformed patterns, on a repeated `(method, pattern)` pair,
    /// and on patterns the path matcher cannot hold side by side (renamed
    /// parameters, a parameter next to a wildcard).
    pub fn build(self) -> Result<Router<S>, RouteError> {
        for group in self.groups.iter().filter(|group| group.routes == 0) {
            debug!(prefix = %group.prefix, "route group has no routes, skipping");
        }

        let mut matcher: matchit::Router<()> = matchit::Router::new();
        let mut by_pattern: Vec<(String, Vec<(Method, Endpoint<S>)>)> = Vec::new();

        for route in self.routes {
            parse_pattern(&route.pattern).map_err(|reason| RouteError::InvalidPattern {
                pattern: route.pattern.clone(),
                reason,
            })?;

            if !by_pattern.iter().any(|(p, _)| *p == route.pattern) {
                check_insert(&mut matcher, &route.pattern)?;
            }

            let index = match by_pattern.iter().position(|(p, _)| *p == route.pattern) {
                Some(index) => index,
                None => {
                    by_pattern.push((route.pattern.clone(), Vec::new()));
                    by_pattern.len() - 1
                }
            };
            let slot = &mut by_pattern[index].1;
            if slot.iter().any(|(method, _)| *method == route.method) {
                return Err(RouteError::Duplicate {
                    method: route.method.to_string(),
                    pattern: route.pattern,
                });
            }

            debug!(
                method = %route.method,
                pattern = %route.pattern,
                handler = route.endpoint.name(),
                "route registered"
            );
            slot.push((route.method, route.endpoint));
        }

        let mut router = Router::new();
        for (pattern, endpoints) in by_pattern {
            let mut merged: Option<MethodRouter<S>> = None;
            for (method, endpoint) in endpoints {
                let method_router = match endpoint {
                    Endpoint::Handler { method_router, .. } => method_router,
                    Endpoint::Unimplemented => placeholder(&method, &pattern),
                };
                merged = Some(match merged {
                    Some(existing) => existing.merge(method_router),
                    None => method_router,
                });
            }
            if let Some(method_router) = merged {
                router = router.route(&pattern, method_router);
            }
        }

        Ok(router)
    }
}

/// Scoped registrar returned by [`Registrar::group`].
pub struct RouteGroup<'r, S> {
    registrar: &'r mut Registrar<S>,
    prefix: String,
    lineage: Vec<usize>,
}

impl<S> RouteGroup<'_, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Register a GET handler under this group.
    pub fn get<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.handler(Method::GET, path, handler)
    }

    /// Register a POST handler under this group.
    pub fn post<H, T>(&mut self, path: &str, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.handler(Method::POST, path, handler)
    }

    /// Register a handler for any method under this group.
    pub fn handler<H, T>(&mut self, method: Method, path: &str, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let pattern = join_paths(&self.prefix, path);
        self.registrar.handler(method, &pattern, handler);
        self.count();
        self
    }

    /// Declare a route under this group that has no behavior yet.
    pub fn unimplemented(&mut self, method: Method, path: &str) -> &mut Self {
        let pattern = join_paths(&self.prefix, path);
        self.registrar.unimplemented(method, &pattern);
        self.count();
        self
    }

    /// Open a nested group.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_, S> {
        let prefix = join_paths(&self.prefix, prefix);
        self.registrar.groups.push(Group {
            prefix: prefix.clone(),
            routes: 0,
        });
        let mut lineage = self.lineage.clone();
        lineage.push(self.registrar.groups.len() - 1);
        RouteGroup {
            registrar: &mut *self.registrar,
            prefix,
            lineage,
        }
    }

    /// Full prefix of this group.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn count(&mut self) {
        for &index in &self.lineage {
            self.registrar.groups[index].routes += 1;
        }
    }
}

fn placeholder<S>(method: &Method, pattern: &str) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let route = pattern.to_string();
    let handler = move || unimplemented_route(route.clone());
    match method_filter(method) {
        Some(filter) => on(filter, handler),
        None => axum::routing::any(handler),
    }
}

/// Insert into a scratch matcher of the same kind axum uses, so conflicts
/// surface as errors instead of a panic in `Router::route`.
fn check_insert(matcher: &mut matchit::Router<()>, pattern: &str) -> Result<(), RouteError> {
    match matcher.insert(pattern, ()) {
        Ok(()) => Ok(()),
        Err(matchit::InsertError::Conflict { with }) => Err(RouteError::Conflict {
            pattern: pattern.to_string(),
            existing: with,
        }),
        Err(_) => Err(RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "rejected by the path matcher",
        }),
    }
}

fn method_filter(method: &Method) -> Option<MethodFilter> {
    MethodFilter::try_from(method.clone()).ok()
}
