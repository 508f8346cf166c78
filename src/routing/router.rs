use std::iter;

use log::debug;
use serde::Serialize;
use url::Url;

use super::host::{Host, HostMut};
use super::method::Method;
use super::params::ParamValue;
use super::tree::{Lookup, PathTree};
use super::zone::{methods_or_panic, Scope, Zone};
use super::{ConstraintFunc, HandlerFunc};
use crate::error::{RouterError, RouterResult};
use crate::log_panic;

/// One registered pattern, as listed by [`Router::routes`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub pattern: String,
    pub methods: Vec<Method>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Route table with zones, named routes and host-scoped sub-tables.
///
/// Built single-threaded, then shared read-only (`Arc<Router>`) by the
/// server's workers.
#[derive(Default)]
pub struct Router {
    scope: Scope,
    hosts: Vec<Host>,
}

impl Router {
    pub fn new() -> Router {
        Router::default()
    }

    /// Opens a top-level zone at `pattern`.
    ///
    /// # Panics
    /// If `pattern` is malformed.
    pub fn path(&mut self, pattern: &str) -> Zone<'_> {
        match self.try_path(pattern) {
            Ok(zone) => zone,
            Err(e) => log_panic!("{}", e),
        }
    }

    pub fn try_path(&mut self, pattern: &str) -> RouterResult<Zone<'_>> {
        let id = self.scope.add_zone(pattern, None)?;
        Ok(Zone::new(&mut self.scope, None, id))
    }

    pub fn path_with_constraint(&mut self, pattern: &str, constraint: ConstraintFunc) -> Zone<'_> {
        let mut zone = self.path(pattern);
        zone.set_constraint(constraint);
        zone
    }

    /// Router-wide before-handlers, hosts included.
    pub fn before<I>(&mut self, methods: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = methods_or_panic(methods);
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        self.scope.interceptors.add_before(&methods, &handlers);
        self
    }

    pub fn after<I>(&mut self, methods: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = methods_or_panic(methods);
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        self.scope.interceptors.add_after(&methods, &handlers);
        self
    }

    /// Host-scoped route table; `*` in `pattern` matches any run of characters.
    ///
    /// Asking again for the same pattern returns the existing host.
    pub fn host(&mut self, pattern: &str) -> HostMut<'_> {
        let Router { scope, hosts } = self;
        let index = match hosts.iter().position(|host| host.pattern() == pattern) {
            Some(index) => index,
            None => {
                let host = match Host::new(pattern) {
                    Ok(host) => host,
                    Err(e) => log_panic!("{}", e),
                };
                debug!("Host '{}' added", pattern);
                hosts.push(host);
                hosts.len() - 1
            }
        };
        HostMut::new(&mut hosts[index], &scope.interceptors)
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// Matches hosts in registration order, then the router's own table.
    pub fn match_route(&self, method: Method, url: &Url) -> Lookup {
        let mut outcome = Lookup::NotFound;
        for host in &self.hosts {
            outcome = outcome.or(host.match_route(method, url));
            if outcome.is_matched() {
                return outcome;
            }
        }
        outcome.or(self.scope.tree.lookup(method, url))
    }

    /// Concrete path of the route named `name`, own names first, then hosts'.
    pub fn reverse(&self, name: &str, params: &[(&str, ParamValue)]) -> RouterResult<String> {
        let scopes = iter::once(&self.scope).chain(self.hosts.iter().map(Host::scope));
        let mut failure = RouterError::UnknownRoute { name: name.to_string() };
        for scope in scopes {
            match scope.reverse(name, params) {
                Ok(url) => return Ok(url),
                Err(e @ RouterError::MissingArgument { .. }) => {
                    if !matches!(failure, RouterError::MissingArgument { .. }) {
                        failure = e;
                    }
                }
                Err(_) => {}
            }
        }
        Err(failure)
    }

    /// Every pattern carrying at least one handler
    pub fn routes(&self) -> Vec<RouteInfo> {
        let mut routes = self.scope.route_infos(None);
        for host in &self.hosts {
            routes.extend(host.route_infos());
        }
        routes
    }

    pub fn tree(&self) -> &PathTree {
        &self.scope.tree
    }
}
