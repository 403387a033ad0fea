use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::http::connection::{Session, SessionConfig};
use crate::http::handler::Handler;

const BACKLOG: u32 = 1024;
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum BindError {
    #[error("failed to resolve {addr}: {source}")]
    Resolve { addr: String, source: io::Error },
    #[error("{0} did not resolve to any address")]
    NoAddress(String),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
}

/// Builds the listening socket. Lets embedders control socket options.
pub trait SocketFactory: Send + Sync {
    fn bind(&self, addr: SocketAddr) -> io::Result<TcpListener>;
}

/// `SO_REUSEADDR` socket with a backlog of 1024.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSocketFactory;

impl SocketFactory for DefaultSocketFactory {
    fn bind(&self, addr: SocketAddr) -> io::Result<TcpListener> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        socket.listen(BACKLOG)
    }
}

/// Accepts connections and runs one [`Session`] task per connection.
pub struct Server<H> {
    host: Option<String>,
    port: u16,
    handler: Arc<H>,
    session: SessionConfig,
    factory: Box<dyn SocketFactory>,
}

impl<H: Handler> Server<H> {
    /// All interfaces, port 80.
    pub fn new(handler: H) -> Self {
        Self {
            host: None,
            port: 80,
            handler: Arc::new(handler),
            session: SessionConfig::default(),
            factory: Box::new(DefaultSocketFactory),
        }
    }

    pub fn from_config(cfg: &Config, handler: H) -> Self {
        Self::new(handler)
            .host(cfg.server.host.clone())
            .port(cfg.server.port)
            .session_config(cfg.session())
    }

    pub fn host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn session_config(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn socket_factory(mut self, factory: impl SocketFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Binds and spawns the accept loop.
    pub async fn start(self) -> Result<RunningServer, BindError> {
        let host = self.host.as_deref().unwrap_or("0.0.0.0");
        let display = format!("{}:{}", host, self.port);

        let addr = tokio::net::lookup_host((host, self.port))
            .await
            .map_err(|source| BindError::Resolve {
                addr: display.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| BindError::NoAddress(display.clone()))?;

        let listener = self
            .factory
            .bind(addr)
            .map_err(|source| BindError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BindError::Bind { addr, source })?;
        info!("Listening on {}", local_addr);

        let task = tokio::spawn(accept_loop(listener, self.handler, self.session));
        Ok(RunningServer { local_addr, task })
    }
}

async fn accept_loop<H: Handler>(listener: TcpListener, handler: Arc<H>, session: SessionConfig) {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };
        debug!("Accepted connection from {}", peer);

        let handler = handler.clone();
        tokio::spawn(async move {
            let session = Session::new(socket, peer, handler, session);
            if let Err(e) = session.run().await {
                debug!(peer = %peer, error = %e, "Session aborted");
            }
        });
    }
}

/// Handle to a started server.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl RunningServer {
    /// The bound address, with the real port when 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting. Sessions already running finish on their own.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Waits for the accept loop, which only ends when aborted.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!(error = %e, "Accept loop panicked");
            }
        }
    }
}
