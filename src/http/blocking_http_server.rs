use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use log::{debug, error, info};

use super::dispatcher::Dispatcher;
use super::Request;
use crate::error::{ResultExt, RouterError, RouterResult};
use crate::routing::{Registry, Router};

/// Thread-per-worker HTTP/1.1 front end for a [`Dispatcher`].
///
/// Every worker blocks in `accept` on the shared listener and serves one
/// connection at a time, closing it after the response.
pub struct HttpServer {
    listen_addr: String,
    listener: TcpListener,
    dispatcher: Dispatcher,
    workers: usize,
}

pub struct HttpServerBuilder {
    addr: Option<String>,
    port: Option<usize>,
    registry: Registry,
    workers: Option<usize>,
}

impl HttpServerBuilder {
    pub fn new() -> HttpServerBuilder {
        Self {
            addr: None,
            port: None,
            registry: Registry::new(),
            workers: None,
        }
    }

    pub fn with_addr(self, addr: &str) -> Self {
        Self {
            addr: Some(addr.to_string()),
            ..self
        }
    }

    /// Port 0 binds an ephemeral port, see [`HttpServer::local_addr`]
    pub fn with_port(self, port: usize) -> Self {
        Self {
            port: Some(port),
            ..self
        }
    }

    /// Appends a router to the registry being built
    pub fn with_router(self, router: Router) -> Self {
        Self {
            registry: self.registry.with_router(router),
            ..self
        }
    }

    /// Replaces every router added so far
    pub fn with_registry(self, registry: Registry) -> Self {
        Self { registry, ..self }
    }

    pub fn with_workers(self, workers: usize) -> Self {
        Self {
            workers: Some(workers),
            ..self
        }
    }

    pub fn build(self) -> RouterResult<HttpServer> {
        let port = self.port.unwrap_or(8080);
        if port > 65535 {
            return Err(RouterError::Config {
                context: format!("Port cannot be higher than 65535, was: {}", port),
            });
        }
        let workers = self.workers.unwrap_or_else(num_cpus::get);
        if workers == 0 {
            return Err(RouterError::Config {
                context: "At least one worker is required".to_string(),
            });
        }

        let listen_addr = format!("{}:{}", self.addr.as_deref().unwrap_or("127.0.0.1"), port);
        let listener = TcpListener::bind(&listen_addr)
            .context(format!("Could not start listening on {}", listen_addr))?;
        let listen_addr = listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or(listen_addr);

        Ok(HttpServer {
            listen_addr,
            listener,
            dispatcher: Dispatcher::new(Arc::new(self.registry)),
            workers,
        })
    }
}

impl Default for HttpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpServer {
    pub fn builder() -> HttpServerBuilder {
        HttpServerBuilder::new()
    }

    pub fn local_addr(&self) -> RouterResult<SocketAddr> {
        self.listener.local_addr().context("Could not read the listen address")
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serves until the process exits.
    pub fn start_blocking(&self) -> RouterResult<()> {
        info!("Starting HTTP server on: {} with {} worker(s)", self.listen_addr, self.workers);
        thread::scope(|scope| {
            for worker in 0..self.workers {
                scope.spawn(move || self.accept_loop(worker));
            }
        });
        Ok(())
    }

    fn accept_loop(&self, worker: usize) {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.serve(stream) {
                        error!("Worker {} dropped a connection: {}", worker, e);
                    }
                }
                Err(e) => error!("Worker {} could not accept a connection: {}", worker, e),
            }
        }
    }

    fn serve(&self, stream: TcpStream) -> RouterResult<()> {
        let peer = stream.peer_addr().map(|addr| addr.to_string()).unwrap_or_default();
        let mut reader = BufReader::new(&stream);

        let mut response = match Request::read_from(&mut reader, &self.listen_addr) {
            Ok(request) => self.dispatcher.dispatch(request),
            Err(e @ RouterError::HttpParse { .. }) => {
                debug!("Rejected request from {}: {}", peer, e);
                e.to_response()
            }
            Err(e) => return Err(e),
        };
        response.headers.insert("Connection", "close");

        let mut writer = &stream;
        writer
            .write_all(response.to_http_string().as_bytes())
            .context(format!("Could not write the response to {}", peer))?;
        writer.flush().context("Could not flush the response")?;
        Ok(())
    }
}
