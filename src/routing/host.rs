use regex::Regex;
use url::Url;

use super::method::Method;
use super::params::{ParamValue, Params};
use super::router::RouteInfo;
use super::tree::Lookup;
use super::zone::{methods_or_panic, Interceptors, Scope, Zone};
use super::{ConstraintFunc, HandlerFunc};
use crate::error::{RouterError, RouterResult};
use crate::log_panic;

/// Route table consulted only for requests whose host matches a pattern
pub struct Host {
    pattern: String,
    regex: Regex,
    constraint: Option<ConstraintFunc>,
    scope: Scope,
}

/// `*` stands for any run of characters, everything else is literal.
fn host_regex(pattern: &str) -> RouterResult<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body)).map_err(|e| RouterError::Config {
        context: format!("host pattern '{}': {}", pattern, e),
    })
}

impl Host {
    pub(crate) fn new(pattern: &str) -> RouterResult<Host> {
        Ok(Host {
            pattern: pattern.to_string(),
            regex: host_regex(pattern)?,
            constraint: None,
            scope: Scope::default(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Host pattern and host constraint both accept `url`
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if !self.regex.is_match(host) {
            return false;
        }
        self.constraint
            .as_ref()
            .map_or(true, |constraint| constraint(url.as_str(), &Params::new()))
    }

    pub fn match_route(&self, method: Method, url: &Url) -> Lookup {
        if !self.matches(url) {
            return Lookup::NotFound;
        }
        self.scope.tree.lookup(method, url)
    }

    pub fn reverse(&self, name: &str, params: &[(&str, ParamValue)]) -> RouterResult<String> {
        self.scope.reverse(name, params)
    }

    pub(crate) fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn route_infos(&self) -> Vec<RouteInfo> {
        self.scope.route_infos(Some(&self.pattern))
    }
}

/// Builder handle over a [`Host`], returned by [`Router::host`](super::Router::host)
pub struct HostMut<'a> {
    host: &'a mut Host,
    outer: &'a Interceptors,
}

impl<'a> HostMut<'a> {
    pub(crate) fn new(host: &'a mut Host, outer: &'a Interceptors) -> HostMut<'a> {
        HostMut { host, outer }
    }

    pub fn pattern(&self) -> &str {
        &self.host.pattern
    }

    /// Opens a zone in the host's table.
    ///
    /// Router-wide before/after handlers registered so far wrap its routes too.
    pub fn path(&mut self, pattern: &str) -> Zone<'_> {
        match self.try_path(pattern) {
            Ok(zone) => zone,
            Err(e) => log_panic!("{}", e),
        }
    }

    pub fn try_path(&mut self, pattern: &str) -> RouterResult<Zone<'_>> {
        let id = self.host.scope.add_zone(pattern, None)?;
        Ok(Zone::new(&mut self.host.scope, Some(self.outer), id))
    }

    pub fn before<I>(&mut self, methods: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = methods_or_panic(methods);
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        self.host.scope.interceptors.add_before(&methods, &handlers);
        self
    }

    pub fn after<I>(&mut self, methods: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = methods_or_panic(methods);
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        self.host.scope.interceptors.add_after(&methods, &handlers);
        self
    }

    /// Checked against the full URL with no parameters, before any route
    pub fn set_constraint(&mut self, constraint: ConstraintFunc) -> &mut Self {
        self.host.constraint = Some(constraint);
        self
    }
}
