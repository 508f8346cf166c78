use std::net::SocketAddr;
use std::sync::Once;
use std::thread;

use egret_router::http::blocking_http_server::HttpServer;
use egret_router::routing::{handler, HandlerFunc, Method, Router};
use serde_json::json;
use url::Url;

static LOGGER: Once = Once::new();

#[allow(dead_code)]
pub fn init_logger() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[allow(dead_code)]
pub fn url(path: &str) -> Url {
    Url::parse(&format!("http://test.com{}", path)).unwrap()
}

/// Handler appending `tag` to the response body
#[allow(dead_code)]
pub fn tag(tag: &'static str) -> HandlerFunc {
    handler(move |ctx| {
        ctx.write(tag);
    })
}

#[allow(dead_code)]
pub fn status_handler() -> HandlerFunc {
    handler(|ctx| {
        ctx.json(&json!({"status": "ok"}));
    })
}

/// Runs the handlers `router` matches for `path` and returns the body they write
#[allow(dead_code)]
pub fn run(router: Router, method: Method, path: &str) -> String {
    use egret_router::http::dispatcher::Dispatcher;
    use egret_router::http::headers::Headers;
    use egret_router::http::Request;

    let request = Request::create(method.as_str(), url(path), Headers::new(), String::new());
    Dispatcher::from(router).dispatch(request).response_body
}

/// Binds an ephemeral port and serves in the background
#[allow(dead_code)]
pub fn spawn_server(router: Router) -> SocketAddr {
    init_logger();
    let server = HttpServer::builder()
        .with_port(0)
        .with_workers(2)
        .with_router(router)
        .build()
        .unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.start_blocking());
    addr
}
