//! Compressed prefix tree holding the route table.
//!
//! Static nodes hold literal text and are split on insertion so that siblings
//! never share a prefix. Param nodes hold one whole path segment worth of
//! tokens and are never split. Lookup walks children in registration order and
//! backtracks on failure; the first branch that resolves wins.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::Arc;

use log::{debug, warn};
use regex::Regex;
use url::Url;

use super::method::Method;
use super::params::Params;
use super::pattern::{capture_segment, normalize_path};
use super::{ConstraintFunc, HandlerChain, HandlerFunc};
use crate::error::{RouterError, RouterResult};
use crate::http::context::Context;

/// How a param node consumes its segment
#[derive(Debug, Clone)]
pub enum Capture {
    /// One open-ended parameter, up to the next `/`
    Segment,
    /// One `*name` parameter, the rest of the path
    Wildcard,
    /// Combined regex anchored at the segment start
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Root,
    Static,
    Param(Capture),
}

pub struct PathNode {
    kind: NodeKind,
    path: String,
    names: Vec<String>,
    handlers: HashMap<Method, HandlerChain>,
    constraint: Option<ConstraintFunc>,
    strict_slash: bool,
    children: Vec<PathNode>,
}

/// Outcome of matching a request against a route table
pub enum Lookup {
    Matched(RouteMatch),
    /// The path resolved to routes, none of them for the requested method
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Handler chain and parameters of a matched route
#[derive(Clone)]
pub struct RouteMatch {
    pub handlers: HandlerChain,
    pub params: Params,
}

impl Lookup {
    pub fn is_matched(&self) -> bool {
        matches!(self, Lookup::Matched(_))
    }

    pub fn into_match(self) -> Option<RouteMatch> {
        match self {
            Lookup::Matched(route) => Some(route),
            _ => None,
        }
    }

    /// Handlers of the match, empty when nothing matched
    pub fn handlers(&self) -> &[HandlerFunc] {
        match self {
            Lookup::Matched(route) => &route.handlers[..],
            _ => &[],
        }
    }

    /// Keeps the better of two outcomes: a match, then a method mismatch, then nothing.
    pub(crate) fn or(self, other: Lookup) -> Lookup {
        match (self, other) {
            (matched @ Lookup::Matched(_), _) => matched,
            (_, matched @ Lookup::Matched(_)) => matched,
            (mismatch @ Lookup::MethodNotAllowed(_), _) => mismatch,
            (_, other) => other,
        }
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Matched(route) => f
                .debug_struct("Matched")
                .field("handlers", &route.handlers.len())
                .field("params", &route.params)
                .finish(),
            Lookup::MethodNotAllowed(allowed) => f.debug_tuple("MethodNotAllowed").field(allowed).finish(),
            Lookup::NotFound => f.write_str("NotFound"),
        }
    }
}

struct Search<'u> {
    method: Method,
    url: &'u Url,
    params: Params,
    allowed: Vec<Method>,
}

impl PathNode {
    fn new(kind: NodeKind, path: &str) -> PathNode {
        PathNode {
            kind,
            path: path.to_string(),
            names: Vec::new(),
            handlers: HashMap::new(),
            constraint: None,
            strict_slash: false,
            children: Vec::new(),
        }
    }

    fn new_param(path: &str) -> RouterResult<PathNode> {
        let capture = capture_segment(path, 0)?;
        let kind = if capture.is_plain() {
            if capture.names[0].starts_with('*') {
                Capture::Wildcard
            } else {
                Capture::Segment
            }
        } else {
            let regex = Regex::new(&format!("^{}", capture.pattern))
                .map_err(|e| RouterError::pattern(path, format!("invalid constraint: {}", e)))?;
            if regex.captures_len() != capture.names.len() + 1 {
                return Err(RouterError::pattern(
                    path,
                    "constraints must not contain capturing groups, use (?:...)",
                ));
            }
            Capture::Pattern(regex)
        };

        let mut node = PathNode::new(NodeKind::Param(kind), &path[..capture.end]);
        node.names = capture.names;
        Ok(node)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn children(&self) -> &[PathNode] {
        &self.children
    }

    pub fn strict_slash(&self) -> bool {
        self.strict_slash
    }

    /// Methods with a registered chain, sorted
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().copied().collect();
        methods.sort();
        methods
    }

    pub fn handlers(&self, method: Method) -> Option<&HandlerChain> {
        self.handlers.get(&method)
    }

    pub fn set_handlers(&mut self, method: Method, chain: Vec<HandlerFunc>) -> &mut Self {
        if self.handlers.insert(method, Arc::from(chain)).is_some() {
            warn!("Replacing {} handlers registered on node '{}'", method, self.path);
        }
        self
    }

    pub fn set_constraint(&mut self, constraint: ConstraintFunc) -> &mut Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn set_strict_slash(&mut self, strict_slash: bool) -> &mut Self {
        self.strict_slash = strict_slash;
        self
    }

    /// Whether inserting `path` may continue through this node
    fn accepts(&self, path: &str) -> bool {
        let matched = common_prefix_len(&self.path, path);
        match self.kind {
            NodeKind::Param(_) => {
                matched == self.path.len() && (matched == path.len() || path[matched..].starts_with('/'))
            }
            _ => matched > 0,
        }
    }

    fn insert(&mut self, path: &str) -> RouterResult<&mut PathNode> {
        let matched = common_prefix_len(&self.path, path);
        if matched < self.path.len() {
            self.split_at(matched);
        }

        let rest = &path[matched..];
        if rest.is_empty() {
            return Ok(self);
        }
        match self.children.iter().position(|child| child.accepts(rest)) {
            Some(index) => self.children[index].insert(rest),
            None => self.add_child(rest),
        }
    }

    /// Keeps `path[..at]` here and moves everything else into a new static child.
    fn split_at(&mut self, at: usize) {
        let suffix = PathNode {
            kind: NodeKind::Static,
            path: self.path[at..].to_string(),
            names: Vec::new(),
            handlers: mem::take(&mut self.handlers),
            constraint: self.constraint.take(),
            strict_slash: mem::replace(&mut self.strict_slash, false),
            children: mem::take(&mut self.children),
        };
        self.path.truncate(at);
        self.children = vec![suffix];
    }

    fn add_child(&mut self, path: &str) -> RouterResult<&mut PathNode> {
        let index = self.children.len();
        match path.find('<') {
            None => {
                self.children.push(PathNode::new(NodeKind::Static, path));
                Ok(&mut self.children[index])
            }
            Some(open) if open > 0 => {
                self.children.push(PathNode::new(NodeKind::Static, &path[..open]));
                self.children[index].add_child(&path[open..])
            }
            Some(_) => {
                let node = PathNode::new_param(path)?;
                let end = node.path.len();
                self.children.push(node);
                if end == path.len() {
                    Ok(&mut self.children[index])
                } else {
                    self.children[index].add_child(&path[end..])
                }
            }
        }
    }

    fn locate(&self, path: &str) -> Option<&PathNode> {
        let rest = path.strip_prefix(self.path.as_str())?;
        if rest.is_empty() {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.locate(rest))
    }

    fn locate_mut(&mut self, path: &str) -> Option<&mut PathNode> {
        let rest = path.strip_prefix(self.path.as_str())?;
        if rest.is_empty() {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.locate_mut(rest))
    }

    fn find(&self, path: &str, search: &mut Search<'_>) -> Option<HandlerChain> {
        let mark = search.params.len();
        let rest = self.consume(path, search)?;

        let found = if rest.is_empty() {
            // a split can leave the slash of "/users/" in a child of its own
            self.resolve(search).or_else(|| {
                self.children
                    .iter()
                    .filter(|child| matches!(child.kind, NodeKind::Static) && child.path == "/")
                    .find_map(|child| child.resolve(search))
            })
        } else {
            self.children
                .iter()
                .find_map(|child| child.find(rest, search))
                .or_else(|| if rest == "/" { self.resolve_trailing_slash(search) } else { None })
        };

        if found.is_none() {
            search.params.truncate(mark);
        }
        found
    }

    /// Matches this node against the front of `path`, returning what is left.
    fn consume<'p>(&self, path: &'p str, search: &mut Search<'_>) -> Option<&'p str> {
        match &self.kind {
            NodeKind::Root => Some(path),
            NodeKind::Static => path.strip_prefix(self.path.as_str()).or_else(|| {
                // "/users/" also serves "/users"
                let implicit_slash = self.path.len() == path.len() + 1
                    && self.path.ends_with('/')
                    && self.path.starts_with(path);
                implicit_slash.then_some("")
            }),
            NodeKind::Param(Capture::Wildcard) => {
                if path.is_empty() {
                    return None;
                }
                search.params.push(&self.names[0], path);
                Some("")
            }
            NodeKind::Param(Capture::Segment) => {
                let end = path.find('/').unwrap_or(path.len());
                if end == 0 {
                    return None;
                }
                search.params.push(&self.names[0], &path[..end]);
                Some(&path[end..])
            }
            NodeKind::Param(Capture::Pattern(regex)) => {
                let segment = &path[..path.find('/').unwrap_or(path.len())];
                let captures = regex.captures(segment)?;
                for (i, name) in self.names.iter().enumerate() {
                    search.params.push(name, captures.get(i + 1).map_or("", |m| m.as_str()));
                }
                let consumed = captures.get(0).map_or(0, |m| m.end());
                Some(&path[consumed..])
            }
        }
    }

    fn resolve(&self, search: &mut Search<'_>) -> Option<HandlerChain> {
        if self.handlers.is_empty() {
            return None;
        }
        if let Some(constraint) = &self.constraint {
            if !constraint(search.url.as_str(), &search.params) {
                return None;
            }
        }
        match self.handlers.get(&search.method) {
            Some(chain) => Some(chain.clone()),
            None => {
                for method in self.handlers.keys() {
                    if !search.allowed.contains(method) {
                        search.allowed.push(*method);
                    }
                }
                None
            }
        }
    }

    fn resolve_trailing_slash(&self, search: &mut Search<'_>) -> Option<HandlerChain> {
        if !self.strict_slash {
            return self.resolve(search);
        }
        if self.handlers.is_empty() {
            return None;
        }

        let path = search.url.path();
        let mut target = path[..path.len() - 1].to_string();
        if let Some(query) = search.url.query() {
            target.push('?');
            target.push_str(query);
        }
        debug!("Redirecting '{}' to '{}'", path, target);
        let redirect: HandlerFunc = Arc::new(move |ctx: &mut Context| {
            ctx.redirect(&target, 301);
        });
        Some(Arc::from(vec![redirect]))
    }

    fn fmt_level(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Root => "root",
            NodeKind::Static => "static",
            NodeKind::Param(Capture::Segment) => "segment",
            NodeKind::Param(Capture::Wildcard) => "wildcard",
            NodeKind::Param(Capture::Pattern(_)) => "regex",
        };
        writeln!(
            f,
            "{}{{kind: {}, path: {:?}, names: {:?}, methods: {:?}, children: {}}}",
            " ".repeat(level * 4),
            kind,
            self.path,
            self.names,
            self.methods(),
            self.children.len()
        )?;
        self.children
            .iter()
            .try_for_each(|child| child.fmt_level(f, level + 1))
    }
}

/// Byte length of the longest common prefix, on a char boundary
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i)
}

/// Route table of one router or host
pub struct PathTree {
    root: PathNode,
}

impl PathTree {
    pub fn new() -> PathTree {
        PathTree {
            root: PathNode::new(NodeKind::Root, ""),
        }
    }

    pub fn root(&self) -> &PathNode {
        &self.root
    }

    /// Inserts `pattern`, returning the node that owns its handlers.
    ///
    /// Inserting the same normalized pattern again returns the same node.
    pub fn insert(&mut self, pattern: &str) -> RouterResult<&mut PathNode> {
        let normalized = normalize_path(pattern)?;
        debug!("Inserting route pattern '{}'", normalized);
        self.root.insert(&normalized)
    }

    /// The node registered for `pattern`, if it was inserted
    pub fn get(&self, pattern: &str) -> Option<&PathNode> {
        let normalized = normalize_path(pattern).ok()?;
        self.root.locate(&normalized)
    }

    pub fn get_mut(&mut self, pattern: &str) -> Option<&mut PathNode> {
        let normalized = normalize_path(pattern).ok()?;
        self.root.locate_mut(&normalized)
    }

    /// Matches the path of `url` for `method`; the query string plays no part.
    pub fn lookup(&self, method: Method, url: &Url) -> Lookup {
        let mut search = Search {
            method,
            url,
            params: Params::new(),
            allowed: Vec::new(),
        };
        match self.root.find(url.path(), &mut search) {
            Some(handlers) => Lookup::Matched(RouteMatch {
                handlers,
                params: search.params,
            }),
            None if !search.allowed.is_empty() => {
                search.allowed.sort();
                Lookup::MethodNotAllowed(search.allowed)
            }
            None => Lookup::NotFound,
        }
    }
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PathTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt_level(f, 0)
    }
}
