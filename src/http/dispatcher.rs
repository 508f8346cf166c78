use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error};

use super::context::Context;
use super::response::Response;
use super::response_builder::ResponseBuilder;
use super::Request;
use crate::routing::{Lookup, Method, Registry, RouteMatch, Router};

/// Turns requests into responses using a shared [`Registry`]
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Dispatcher {
        Dispatcher { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn dispatch(&self, request: Request) -> Response {
        let method_name = request.method.clone();
        let path = request.path().to_string();

        let response = match request.method.parse::<Method>() {
            Err(e) => e.to_response(),
            Ok(method) => match self.registry.match_route(method, &request.url) {
                Lookup::Matched(route) => self.run(request, route),
                Lookup::MethodNotAllowed(allowed) => {
                    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                    ResponseBuilder::new(405)
                        .header("Allow", allow)
                        .body(format!("Method {} not allowed on {}", method, path))
                        .build()
                }
                Lookup::NotFound => ResponseBuilder::not_found()
                    .body(format!("Resource: {} not found.", path))
                    .build(),
            },
        };

        debug!("{} {} -> {}", method_name, path, response.status_code);
        response
    }

    fn run(&self, request: Request, route: RouteMatch) -> Response {
        let path = request.path().to_string();
        let ctx = Context::new(request, route).with_registry(Arc::clone(&self.registry));
        let outcome = catch_unwind(AssertUnwindSafe(move || {
            let mut ctx = ctx;
            ctx.next();
            ctx.into_response()
        }));

        match outcome {
            Ok(response) => response,
            Err(cause) => {
                error!("Handler panicked while serving {}: {}", path, panic_message(cause.as_ref()));
                ResponseBuilder::internal_error()
                    .body("Internal Server Error")
                    .build()
            }
        }
    }
}

impl From<Registry> for Dispatcher {
    fn from(registry: Registry) -> Self {
        Dispatcher::new(Arc::new(registry))
    }
}

impl From<Router> for Dispatcher {
    fn from(router: Router) -> Self {
        Dispatcher::from(Registry::from(router))
    }
}
