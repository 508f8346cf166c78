//! Per-request state handed to every handler of a matched chain.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use serde::Serialize;
use serde_json::Value;

use super::headers::Headers;
use super::http_status::HttpStatus;
use super::response::Response;
use super::Request;
use crate::error::{RouterError, RouterResult};
use crate::routing::{HandlerChain, ParamValue, Params, Registry, RouteMatch};

/// Runs a handler chain and collects the response it writes.
///
/// Handlers run in chain order. A handler that calls [`Context::next`] runs the
/// rest of the chain right away and regains control afterwards, which is how
/// middleware wraps the handlers behind it.
pub struct Context {
    request: Request,
    params: Params,
    handlers: HandlerChain,
    index: usize,
    aborted: bool,
    response: Response,
    registry: Option<Arc<Registry>>,
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new(request: Request, route: RouteMatch) -> Context {
        Context {
            request,
            params: route.params,
            handlers: route.handlers,
            index: 0,
            aborted: false,
            response: Response::create(200, String::new()),
            registry: None,
            values: HashMap::new(),
        }
    }

    /// Registry used by [`Context::reverse_url`]
    pub fn with_registry(self, registry: Arc<Registry>) -> Context {
        Context {
            registry: Some(registry),
            ..self
        }
    }

    /// Runs the handlers that have not run yet.
    pub fn next(&mut self) {
        while self.index < self.handlers.len() {
            let handler = Arc::clone(&self.handlers[self.index]);
            self.index += 1;
            handler(self);
        }
    }

    /// Skips every handler that has not started yet.
    pub fn abort(&mut self) {
        self.index = self.handlers.len();
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Captured parameter, raw as it appeared in the path
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// First value of a query parameter, percent-decoded
    pub fn query(&self, name: &str) -> Option<String> {
        self.request
            .url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request.headers.get(name)
    }

    /// Stores a value for the handlers later in the chain.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn status(&self) -> u16 {
        self.response.status_code
    }

    pub fn set_status(&mut self, status_code: u16) -> &mut Self {
        self.response.status_code = status_code;
        self
    }

    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        self.response.headers.insert(name, value);
        self
    }

    pub fn headers(&self) -> &Headers {
        &self.response.headers
    }

    /// Appends to the response body.
    pub fn write(&mut self, text: &str) -> &mut Self {
        self.response.response_body.push_str(text);
        self
    }

    pub fn body(&self) -> &str {
        &self.response.response_body
    }

    /// Replaces the body with `data` as JSON.
    pub fn json<T: Serialize>(&mut self, data: &T) -> &mut Self {
        match serde_json::to_string(data) {
            Ok(json) => {
                self.response.response_body = json;
                self.header("Content-Type", "application/json")
            }
            Err(e) => {
                warn!("JSON serialization failed for {}: {}", self.request.path(), e);
                self.response.response_body = format!("JSON serialization error: {}", e);
                self.set_status(500)
            }
        }
    }

    pub fn redirect(&mut self, location: &str, status_code: u16) -> &mut Self {
        if !HttpStatus::is_redirect(status_code) {
            warn!("Redirect to {} uses non-redirect status {}", location, status_code);
        }
        self.set_status(status_code).header("Location", location)
    }

    pub fn not_found(&mut self, message: &str) -> &mut Self {
        self.response.response_body = message.to_string();
        self.set_status(404)
    }

    /// Path of a named route from the registry this request is served by.
    pub fn reverse_url(&self, name: &str, params: &[(&str, ParamValue)]) -> RouterResult<String> {
        match &self.registry {
            Some(registry) => registry.reverse(name, params),
            None => Err(RouterError::UnknownRoute { name: name.to_string() }),
        }
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}
