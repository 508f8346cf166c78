mod common;

use std::sync::Arc;

use egret_router::error::RouterError;
use egret_router::routing::{constraint, handler, Lookup, Method, Registry, Router};

use crate::common::{run, tag, url};

fn params(router: &Router, method: Method, path: &str) -> Vec<(String, String)> {
    router
        .match_route(method, &url(path))
        .into_match()
        .unwrap_or_else(|| panic!("{} {} should match", method, path))
        .params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn literal_routes() {
    let mut router = Router::new();
    router.path("/").get([tag("home")]);
    router.path("/users").get([tag("users")]);
    router.path("/users/new").get([tag("new")]);

    assert_eq!(run(router, Method::Get, "/users/new"), "new");
}

#[test]
fn documented_matching_cases() {
    let mut router = Router::new();
    router.path("/abc/<p1>/<p2>/<p3>").get([tag("abc")]);
    router.path("/users/<name>/<id>.json").get([tag("json")]);
    router.path("/posts/<name>-<id:\\d+>.json").get([tag("glued")]);
    router.path("/files/<*path>").get([tag("files")]);

    assert_eq!(
        params(&router, Method::Get, "/abc/111/222/33"),
        pairs(&[("p1", "111"), ("p2", "222"), ("p3", "33")])
    );
    assert_eq!(
        params(&router, Method::Get, "/users/chris/123.json"),
        pairs(&[("name", "chris"), ("id", "123")])
    );
    assert_eq!(
        params(&router, Method::Get, "/posts/chris-123.json"),
        pairs(&[("name", "chris"), ("id", "123")])
    );
    assert!(!router.match_route(Method::Get, &url("/posts/chris-abc.json")).is_matched());
    assert_eq!(
        params(&router, Method::Get, "/files/chris/123.json"),
        pairs(&[("*path", "chris/123.json")])
    );
}

#[test]
fn query_string_is_ignored() {
    let mut router = Router::new();
    router.path("/users/<id>").get([tag("user")]);

    assert_eq!(params(&router, Method::Get, "/users/123?action=delete"), pairs(&[("id", "123")]));
    assert_eq!(params(&router, Method::Get, "/users/123/?action=delete"), pairs(&[("id", "123")]));
}

#[test]
fn registration_order_and_backtracking() {
    let mut router = Router::new();
    router.path("/<*path>").options([tag("cors")]);
    router.path("/test/<id:[^.]+>").get([tag("page")]);
    router.path("/test/<id:[^.]+>.mp4").get([tag("video")]);

    let lookup = router.match_route(Method::Get, &url("/test/abc.mp4"));
    assert!(lookup.is_matched());
    assert_eq!(params(&router, Method::Get, "/test/abc.mp4"), pairs(&[("id", "abc")]));
    assert_eq!(params(&router, Method::Options, "/test/abc.mp4"), pairs(&[("*path", "test/abc.mp4")]));
    assert_eq!(run(router, Method::Get, "/test/abc.mp4"), "video");
}

#[test]
fn same_pattern_twice_is_one_route() {
    let mut router = Router::new();
    router.path("/users/<id>").get([tag("get")]);
    router.path("users/<id:[^/]+>").post([tag("post")]);

    let routes = router.routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].methods, vec![Method::Get, Method::Post]);
}

#[test]
fn zones_compose_middleware_outside_in() {
    let mut router = Router::new();
    router.before("*", [tag("[r")]).after("*", [tag("r]")]);
    let mut api = router.path("/api");
    api.before("GET", [tag("[api")]).after("GET", [tag("api]")]);
    let mut users = api.path("/users");
    users.before("GET", [tag("[users")]);
    users.path("/<id:\\d+>").get([tag("show")]);

    assert_eq!(run(router, Method::Get, "/api/users/7"), "[r[api[usersshowapi]r]");
}

#[test]
fn middleware_can_short_circuit() {
    let mut router = Router::new();
    let mut admin = router.path("/admin");
    admin.before(
        "*",
        [handler(|ctx| {
            if ctx.request().headers.get("authorization").is_none() {
                ctx.set_status(401).write("denied").abort();
            }
        })],
    );
    admin.path("/panel").get([tag("panel")]);

    assert_eq!(run(router, Method::Get, "/admin/panel"), "denied");
}

#[test]
fn zone_middleware_hands_values_to_routes() {
    let mut router = Router::new();
    let mut api = router.path("/api");
    api.before(
        "*",
        [handler(|ctx| {
            let tenant = ctx.query("tenant").unwrap_or_else(|| "public".to_string());
            ctx.set("tenant", tenant);
        })],
    );
    api.path("/items").get([handler(|ctx| {
        let tenant = ctx.get("tenant").and_then(|v| v.as_str()).unwrap_or("unset").to_string();
        ctx.write(&tenant);
    })]);

    let dispatcher = egret_router::http::dispatcher::Dispatcher::from(router);
    let request = |path: &str| {
        egret_router::http::Request::create("GET", url(path), Default::default(), String::new())
    };
    assert_eq!(dispatcher.dispatch(request("/api/items?tenant=acme")).response_body, "acme");
    assert_eq!(dispatcher.dispatch(request("/api/items")).response_body, "public");
}

#[test]
fn reverse_round_trip() {
    let mut router = Router::new();
    router.path("/users/<name>-<id:\\d+>.json").get([tag("u")]).name("user");

    let path = router.reverse("user", &[("name", "chris".into()), ("id", 123.into())]).unwrap();
    assert_eq!(path, "/users/chris-123.json");
    assert_eq!(
        params(&router, Method::Get, &path),
        pairs(&[("name", "chris"), ("id", "123")])
    );

    assert_eq!(
        router.reverse("user", &[("name", "chris".into())]),
        Err(RouterError::MissingArgument {
            route: "user".to_string(),
            name: "id".to_string()
        })
    );
}

#[test]
fn strict_slash_redirect_keeps_the_query() {
    let mut router = Router::new();
    router.path("/about").set_strict_slash(true).get([tag("about")]);

    let registry = Arc::new(Registry::from(router));
    let lookup = registry.match_route(Method::Get, &url("/about/?lang=en"));
    assert_eq!(lookup.handlers().len(), 1);

    let response = {
        use egret_router::http::dispatcher::Dispatcher;
        use egret_router::http::headers::Headers;
        use egret_router::http::Request;
        let request = Request::create("GET", url("/about/?lang=en"), Headers::new(), String::new());
        Dispatcher::new(registry).dispatch(request)
    };
    assert_eq!(response.status_code, 301);
    assert_eq!(response.headers.get("Location"), Some("/about?lang=en"));
}

#[test]
fn method_mismatch_is_reported() {
    let mut router = Router::new();
    router.path("/items").route("GET,PUT", [tag("items")]);

    match router.match_route(Method::Delete, &url("/items")) {
        Lookup::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::Get, Method::Put]),
        other => panic!("unexpected lookup: {:?}", other),
    }
}

#[test]
fn hosts_and_registry_fallback() {
    let mut site = Router::new();
    site.host("api.*").path("/ping").get([tag("api pong")]);
    site.path("/ping").get([tag("pong")]);

    let mut fallback = Router::new();
    fallback.path("/health").get([tag("ok")]);
    let registry = Registry::new().with_router(site).with_router(fallback);

    let api = url::Url::parse("http://api.test.com/ping").unwrap();
    assert!(registry.match_route(Method::Get, &api).is_matched());
    assert!(registry.match_route(Method::Get, &url("/health")).is_matched());
    assert!(matches!(registry.match_route(Method::Get, &url("/nope")), Lookup::NotFound));
}

#[test]
fn constraints_and_name_conflicts() {
    let mut router = Router::new();
    router
        .path_with_constraint("/beta", constraint(|url, _| url.contains("beta=1")))
        .get([tag("beta")]);
    assert!(router.match_route(Method::Get, &url("/beta?beta=1")).is_matched());
    assert!(!router.match_route(Method::Get, &url("/beta")).is_matched());

    router.path("/a").name("dup");
    assert!(matches!(
        router.path("/b").try_name("dup"),
        Err(RouterError::DuplicateName { .. })
    ));
    assert!(matches!(router.try_path("/users/<id"), Err(RouterError::Pattern { .. })));
}
