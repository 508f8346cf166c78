//! Zones: nested route groups sharing a path prefix and middleware.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::method::Method;
use super::params::ParamValue;
use super::pattern::{join_path, normalize_path, reverse_pattern};
use super::router::RouteInfo;
use super::tree::{PathNode, PathTree};
use super::{ConstraintFunc, HandlerFunc};
use crate::error::{RouterError, RouterResult};
use crate::log_panic;

pub(crate) type HandlerTable = HashMap<Method, Vec<HandlerFunc>>;

/// Before/after handlers of one level of the routing hierarchy
#[derive(Default, Clone)]
pub(crate) struct Interceptors {
    before: HandlerTable,
    after: HandlerTable,
}

impl Interceptors {
    pub(crate) fn add_before(&mut self, methods: &[Method], handlers: &[HandlerFunc]) {
        for method in methods {
            self.before.entry(*method).or_default().extend_from_slice(handlers);
        }
    }

    pub(crate) fn add_after(&mut self, methods: &[Method], handlers: &[HandlerFunc]) {
        for method in methods {
            self.after.entry(*method).or_default().extend_from_slice(handlers);
        }
    }

    /// `before ++ chain ++ after` for `method`
    pub(crate) fn wrap(&self, method: Method, chain: Vec<HandlerFunc>) -> Vec<HandlerFunc> {
        let before = self.before.get(&method).map_or(&[][..], Vec::as_slice);
        let after = self.after.get(&method).map_or(&[][..], Vec::as_slice);
        if before.is_empty() && after.is_empty() {
            return chain;
        }

        let mut wrapped = Vec::with_capacity(before.len() + chain.len() + after.len());
        wrapped.extend_from_slice(before);
        wrapped.extend(chain);
        wrapped.extend_from_slice(after);
        wrapped
    }
}

pub(crate) struct ZoneEntry {
    path: String,
    parent: Option<usize>,
    children: Vec<usize>,
    interceptors: Interceptors,
}

/// Route table plus the zones and names built on top of it.
///
/// A router owns one scope, so does every host.
#[derive(Default)]
pub(crate) struct Scope {
    pub(crate) tree: PathTree,
    pub(crate) interceptors: Interceptors,
    zones: Vec<ZoneEntry>,
    named: HashMap<String, usize>,
}

impl Scope {
    pub(crate) fn add_zone(&mut self, pattern: &str, parent: Option<usize>) -> RouterResult<usize> {
        let path = normalize_path(pattern)?;
        self.tree.insert(&path)?;

        let id = self.zones.len();
        self.zones.push(ZoneEntry {
            path,
            parent,
            children: Vec::new(),
            interceptors: Interceptors::default(),
        });
        if let Some(parent) = parent {
            self.zones[parent].children.push(id);
        }
        Ok(id)
    }

    pub(crate) fn reverse(&self, name: &str, params: &[(&str, ParamValue)]) -> RouterResult<String> {
        let id = self
            .named
            .get(name)
            .ok_or_else(|| RouterError::UnknownRoute { name: name.to_string() })?;
        reverse_pattern(name, &self.zones[*id].path, params)
    }

    pub(crate) fn route_infos(&self, host: Option<&str>) -> Vec<RouteInfo> {
        let mut seen = HashSet::new();
        self.zones
            .iter()
            .filter(|zone| seen.insert(zone.path.as_str()))
            .filter_map(|zone| {
                let methods = self.tree.get(&zone.path)?.methods();
                if methods.is_empty() {
                    return None;
                }
                let name = self
                    .named
                    .iter()
                    .filter(|(_, id)| self.zones[**id].path == zone.path)
                    .map(|(name, _)| name.clone())
                    .min();
                Some(RouteInfo {
                    pattern: zone.path.clone(),
                    methods,
                    name,
                    host: host.map(str::to_string),
                })
            })
            .collect()
    }
}

pub(crate) fn methods_or_panic(methods: &str) -> Vec<Method> {
    match Method::parse_list(methods) {
        Ok(methods) => methods,
        Err(e) => log_panic!("{}", e),
    }
}

/// Builder handle over one zone.
///
/// Obtained from [`Router::path`](super::Router::path),
/// [`HostMut::path`](super::HostMut::path) or [`Zone::path`]; it borrows the
/// router for as long as it lives:
///
/// ```
/// use egret_router::routing::{handler, Router};
///
/// let mut router = Router::new();
/// let mut api = router.path("/api");
/// api.before("*", [handler(|_| {})]);
/// api.path("/users").get([handler(|_| {})]).name("users");
/// api.path("/users/<id:\\d+>").get([handler(|_| {})]).name("user");
/// ```
pub struct Zone<'a> {
    scope: &'a mut Scope,
    outer: Option<&'a Interceptors>,
    id: usize,
}

impl<'a> Zone<'a> {
    pub(crate) fn new(scope: &'a mut Scope, outer: Option<&'a Interceptors>, id: usize) -> Zone<'a> {
        Zone { scope, outer, id }
    }

    /// The zone's normalized pattern
    pub fn pattern(&self) -> &str {
        &self.scope.zones[self.id].path
    }

    pub fn parent_pattern(&self) -> Option<&str> {
        self.scope.zones[self.id]
            .parent
            .map(|parent| self.scope.zones[parent].path.as_str())
    }

    pub fn sub_zones(&self) -> usize {
        self.scope.zones[self.id].children.len()
    }

    /// Creates a sub-zone at this zone's pattern joined with `sub`.
    ///
    /// # Panics
    /// If the joined pattern is malformed.
    pub fn path(&mut self, sub: &str) -> Zone<'_> {
        match self.try_path(sub) {
            Ok(zone) => zone,
            Err(e) => log_panic!("{}", e),
        }
    }

    pub fn try_path(&mut self, sub: &str) -> RouterResult<Zone<'_>> {
        let joined = join_path(self.pattern(), sub);
        let id = self.scope.add_zone(&joined, Some(self.id))?;
        debug!("Zone '{}' opened below '{}'", self.scope.zones[id].path, self.pattern());
        Ok(Zone {
            scope: &mut *self.scope,
            outer: self.outer,
            id,
        })
    }

    /// Registers `handlers` for every method of `methods` (`"*"` or a comma list).
    ///
    /// # Panics
    /// If `methods` names an unknown verb.
    pub fn route<I>(&mut self, methods: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = methods_or_panic(methods);
        self.register(&methods, handlers)
    }

    pub fn try_route<I>(&mut self, methods: &str, handlers: I) -> RouterResult<&mut Self>
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = Method::parse_list(methods)?;
        Ok(self.register(&methods, handlers))
    }

    fn register<I>(&mut self, methods: &[Method], handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        for method in methods {
            let chain = self.compose(*method, handlers.clone());
            debug!("{} {} -> {} handler(s)", method, self.pattern(), chain.len());
            self.node_mut().set_handlers(*method, chain);
        }
        self
    }

    /// Wraps `handlers` in every enclosing level, innermost first, so the
    /// outermost before-handlers run first and its after-handlers last.
    fn compose(&self, method: Method, handlers: Vec<HandlerFunc>) -> Vec<HandlerFunc> {
        let mut chain = handlers;
        let mut current = Some(self.id);
        while let Some(id) = current {
            let zone = &self.scope.zones[id];
            chain = zone.interceptors.wrap(method, chain);
            current = zone.parent;
        }
        chain = self.scope.interceptors.wrap(method, chain);
        match self.outer {
            Some(outer) => outer.wrap(method, chain),
            None => chain,
        }
    }

    fn node_mut(&mut self) -> &mut PathNode {
        let Scope { tree, zones, .. } = &mut *self.scope;
        let path = &zones[self.id].path;
        match tree.get_mut(path) {
            Some(node) => node,
            None => log_panic!("Route node for zone '{}' is missing from the tree", path),
        }
    }

    /// Handlers run ahead of routes registered on this zone afterwards.
    pub fn before<I>(&mut self, methods: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = methods_or_panic(methods);
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        self.scope.zones[self.id].interceptors.add_before(&methods, &handlers);
        self
    }

    /// Handlers run after routes registered on this zone afterwards.
    pub fn after<I>(&mut self, methods: &str, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let methods = methods_or_panic(methods);
        let handlers: Vec<HandlerFunc> = handlers.into_iter().collect();
        self.scope.zones[self.id].interceptors.add_after(&methods, &handlers);
        self
    }

    pub fn set_constraint(&mut self, constraint: ConstraintFunc) -> &mut Self {
        self.node_mut().set_constraint(constraint);
        self
    }

    pub fn set_strict_slash(&mut self, strict_slash: bool) -> &mut Self {
        self.node_mut().set_strict_slash(strict_slash);
        self
    }

    /// Names the zone for reversal.
    ///
    /// # Panics
    /// If the name already belongs to a different pattern.
    pub fn name(&mut self, name: &str) -> &mut Self {
        if let Err(e) = self.try_name(name) {
            log_panic!("{}", e);
        }
        self
    }

    pub fn try_name(&mut self, name: &str) -> RouterResult<&mut Self> {
        match self.scope.named.get(name) {
            Some(&id) if self.scope.zones[id].path == self.scope.zones[self.id].path => {}
            Some(_) => {
                return Err(RouterError::DuplicateName { name: name.to_string() });
            }
            None => {
                self.scope.named.insert(name.to_string(), self.id);
            }
        }
        Ok(self)
    }

    pub fn any<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&Method::ALL, handlers)
    }

    pub fn get<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Get], handlers)
    }

    pub fn post<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Post], handlers)
    }

    pub fn delete<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Delete], handlers)
    }

    pub fn put<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Put], handlers)
    }

    pub fn patch<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Patch], handlers)
    }

    pub fn connect<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Connect], handlers)
    }

    pub fn head<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Head], handlers)
    }

    pub fn options<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Options], handlers)
    }

    pub fn trace<I: IntoIterator<Item = HandlerFunc>>(&mut self, handlers: I) -> &mut Self {
        self.register(&[Method::Trace], handlers)
    }
}
