use std::sync::Arc;

use crate::http::context::Context;

pub mod host;
pub mod method;
pub mod params;
pub mod pattern;
pub mod registry;
pub mod router;
pub mod tree;
pub mod zone;

pub use self::host::{Host, HostMut};
pub use self::method::Method;
pub use self::params::{ParamValue, Params};
pub use self::registry::Registry;
pub use self::router::{RouteInfo, Router};
pub use self::tree::{Lookup, PathTree, RouteMatch};
pub use self::zone::Zone;

/// A step of a route's handler chain
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// The ordered chain stored per method on a route
pub type HandlerChain = Arc<[HandlerFunc]>;

/// Extra matching predicate over the full URL and the parameters captured so far
pub type ConstraintFunc = Arc<dyn Fn(&str, &Params) -> bool + Send + Sync>;

pub fn handler<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn constraint<F>(f: F) -> ConstraintFunc
where
    F: Fn(&str, &Params) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}
