use env_logger::Env;
use egret_router::http::blocking_http_server::HttpServer;
use egret_router::routing::{handler, Router};
use serde_json::json;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut router = Router::new();
    router.before(
        "*",
        [handler(|ctx| {
            ctx.header("X-Served-By", "egret");
        })],
    );
    router.path("/status").get([handler(|ctx| {
        ctx.json(&json!({"status": "ok"}));
    })]);

    let mut api = router.path("/api");
    api.before(
        "POST,PUT,DELETE",
        [handler(|ctx| {
            if ctx.request().headers.get("authorization").is_none() {
                ctx.set_status(401).write("missing credentials").abort();
            }
        })],
    );

    let mut users = api.path("/users");
    users.set_strict_slash(true).get([handler(|ctx| {
        let link = ctx
            .reverse_url("user", &[("id", 1.into())])
            .unwrap_or_default();
        ctx.json(&json!({"users": [link]}));
    })]);
    users.path("/<id:\\d+>").name("user").route(
        "GET,DELETE",
        [handler(|ctx| {
            let id = ctx.param("id").unwrap_or_default().to_string();
            let method = ctx.request().method.clone();
            ctx.json(&json!({"id": id, "method": method}));
        })],
    );

    router.path("/files/<*path>").get([handler(|ctx| {
        let path = ctx.param("*path").unwrap_or_default().to_string();
        ctx.write(&path);
    })]);

    log::info!("Route table:\n{}", router.tree());
    for route in router.routes() {
        log::info!("{}", serde_json::to_string(&route).unwrap_or_default());
    }

    let server = HttpServer::builder()
        .with_port(8090)
        .with_router(router)
        .build()
        .unwrap_or_else(|e| panic!("{}", e));
    if let Err(e) = server.start_blocking() {
        log::error!("Server stopped: {}", e);
    }
}
