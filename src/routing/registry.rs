use log::trace;
use url::Url;

use super::method::Method;
use super::params::ParamValue;
use super::router::{RouteInfo, Router};
use super::tree::Lookup;
use crate::error::{RouterError, RouterResult};

/// Ordered set of routers consulted by the dispatcher.
///
/// The first router that matches wins. A router that only knows the path
/// under other methods is remembered and reported if nothing else matches.
#[derive(Default)]
pub struct Registry {
    routers: Vec<Router>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn with_router(mut self, router: Router) -> Registry {
        self.routers.push(router);
        self
    }

    pub fn push(&mut self, router: Router) -> &mut Router {
        self.routers.push(router);
        let last = self.routers.len() - 1;
        &mut self.routers[last]
    }

    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    pub fn match_route(&self, method: Method, url: &Url) -> Lookup {
        let mut outcome = Lookup::NotFound;
        for (i, router) in self.routers.iter().enumerate() {
            outcome = outcome.or(router.match_route(method, url));
            if outcome.is_matched() {
                trace!("{} {} matched by router #{}", method, url.path(), i);
                break;
            }
        }
        outcome
    }

    /// Reverses `name` against each router in order.
    pub fn reverse(&self, name: &str, params: &[(&str, ParamValue)]) -> RouterResult<String> {
        let mut failure = RouterError::UnknownRoute { name: name.to_string() };
        for router in &self.routers {
            match router.reverse(name, params) {
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

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routers.iter().flat_map(Router::routes).collect()
    }
}

impl From<Router> for Registry {
    fn from(router: Router) -> Self {
        Registry::new().with_router(router)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::routing::handler;

    fn url(path: &str) -> Url {
        Url::parse(&format!("http://test.com{}", path)).unwrap()
    }

    #[test]
    fn first_matching_router_wins() {
        let first = handler(|_| {});
        let second = handler(|_| {});
        let mut a = Router::new();
        a.path("/users").get([first.clone()]);
        let mut b = Router::new();
        b.path("/users").get([second.clone()]);
        b.path("/posts").get([second.clone()]);
        let registry = Registry::new().with_router(a).with_router(b);

        assert!(Arc::ptr_eq(&registry.match_route(Method::Get, &url("/users")).handlers()[0], &first));
        assert!(Arc::ptr_eq(&registry.match_route(Method::Get, &url("/posts")).handlers()[0], &second));
        assert!(matches!(registry.match_route(Method::Get, &url("/tags")), Lookup::NotFound));
    }

    #[test]
    fn later_routers_still_match_after_a_method_mismatch() {
        let mut a = Router::new();
        a.path("/users").post([handler(|_| {})]);
        let mut b = Router::new();
        b.path("/users").get([handler(|_| {})]);
        let registry = Registry::new().with_router(a).with_router(b);

        assert!(registry.match_route(Method::Get, &url("/users")).is_matched());
        assert!(matches!(
            registry.match_route(Method::Put, &url("/users")),
            Lookup::MethodNotAllowed(_)
        ));
    }

    #[test]
    fn reverses_across_routers() {
        let mut registry = Registry::new();
        registry.push(Router::new()).path("/a").name("a");
        registry.push(Router::new()).path("/b/<id>").name("b");

        assert_eq!(registry.reverse("a", &[]).unwrap(), "/a");
        assert_eq!(registry.reverse("b", &[("id", 1.into())]).unwrap(), "/b/1");
        assert!(matches!(registry.reverse("b", &[]), Err(RouterError::MissingArgument { .. })));
        assert!(matches!(registry.reverse("c", &[]), Err(RouterError::UnknownRoute { .. })));
        assert_eq!(registry.len(), 2);
    }
}
