use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, error, info, warn};

use super::config::ServerConfig;
use super::slot_table::{SlotGuard, SlotId, SlotTable};
use crate::connection::{InputMessage, OutputMessage};
use crate::ensure;
use crate::handler::Handler;
use crate::protocol::ServerError;

/// Host used when `start` is given none
const DEFAULT_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// What became of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// A slot was claimed and a worker now serves the connection
    Dispatched { slot: SlotId, peer: SocketAddr },
    /// Every slot was busy; the connection was closed without calling the handler
    Rejected { peer: SocketAddr },
}

/// An HTTP/1.1 server serving one request/response exchange per connection.
///
/// The caller drives acceptance: each [`accept`](Self::accept) waits a bounded time for
/// one connection and hands it to a worker task running the handler. At most
/// `max_clients` connections are served at once; connections beyond that are closed
/// right away.
///
/// ```no_run
/// use std::sync::Arc;
/// use futures::FutureExt;
/// use webster::handler::make_handler;
/// use webster::server::Server;
///
/// # async fn serve() -> Result<(), webster::protocol::ServerError> {
/// let handler = Arc::new(make_handler(|_input, output| {
///     async move {
///         let _ = output.write_string("hello").await;
///     }
///     .boxed()
/// }));
///
/// let mut server = Server::new(16);
/// server.start(Some("127.0.0.1"), 8080).await?;
/// server.run(handler, async { let _ = tokio::signal::ctrl_c().await; }).await
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    slots: Arc<SlotTable>,
    listener: Option<TcpListener>,
}

impl Server {
    /// Creates a server with `max_clients` connection slots and default settings.
    pub fn new(max_clients: usize) -> Self {
        Self::with_config(ServerConfig::default().with_max_clients(max_clients))
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self { slots: Arc::new(SlotTable::new(config.max_clients())), config, listener: None }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[inline]
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.slots.occupied()
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        let listener = self.listener.as_ref().ok_or(ServerError::NotListening)?;
        Ok(listener.local_addr()?)
    }

    /// Binds and listens on the IPv4 address of `host` (loopback when absent), returning
    /// the bound address. Port `0` picks a free port.
    ///
    /// # Errors
    ///
    /// - `AlreadyListening` if the server was started before
    /// - `InvalidAddress` if `host` has no IPv4 address
    /// - `Socket` if the socket can't be created, bound or put in listening mode
    pub async fn start(&mut self, host: Option<&str>, port: u16) -> Result<SocketAddr, ServerError> {
        ensure!(self.listener.is_none(), ServerError::AlreadyListening);

        let addr = resolve(host, port).await?;
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(SocketAddr::V4(addr))?;
        let listener = socket.listen(u32::try_from(self.config.max_clients()).unwrap_or(u32::MAX))?;

        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, max_clients = self.config.max_clients(), "start listening");
        self.listener = Some(listener);
        Ok(local_addr)
    }

    /// Waits up to the accept timeout for one connection and dispatches it to `handler`.
    ///
    /// # Errors
    ///
    /// - `NotListening` before [`start`](Self::start) or after [`stop`](Self::stop)
    /// - `Timeout` if no connection arrived in time, `NoClient` if the accept would block;
    ///   both only mean the caller may try again
    /// - `Socket` for any other accept failure
    pub async fn accept<H>(&mut self, handler: &Arc<H>) -> Result<Accepted, ServerError>
    where
        H: Handler + 'static,
    {
        let listener = self.listener.as_ref().ok_or(ServerError::NotListening)?;
        let timeout = self.config.accept_timeout();

        let (stream, peer) = match tokio::time::timeout(timeout, listener.accept()).await {
            Err(_) => return Err(ServerError::Timeout { timeout }),
            Ok(Err(e)) if e.kind() == ErrorKind::WouldBlock => return Err(ServerError::NoClient),
            Ok(Err(e)) => return Err(ServerError::socket(e)),
            Ok(Ok(accepted)) => accepted,
        };

        let Some(slot) = self.slots.claim(peer) else {
            warn!(peer = %peer, max_clients = self.config.max_clients(), "all connection slots busy, rejecting connection");
            reject(stream).await;
            return Ok(Accepted::Rejected { peer });
        };

        let guard = SlotGuard::new(Arc::clone(&self.slots), slot);
        let worker = tokio::spawn(serve(stream, peer, guard, Arc::clone(handler), self.config));
        self.slots.attach(slot, worker);

        debug!(peer = %peer, slot = slot.index(), "connection dispatched");
        Ok(Accepted::Dispatched { slot, peer })
    }

    /// Accepts connections until `shutdown` resolves, then stops the server.
    ///
    /// Timeouts are retried silently; other accept failures are logged and retried.
    pub async fn run<H, S>(&mut self, handler: Arc<H>, shutdown: S) -> Result<(), ServerError>
    where
        H: Handler + 'static,
        S: Future<Output = ()>,
    {
        ensure!(self.is_listening(), ServerError::NotListening);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }

                accepted = self.accept(&handler) => match accepted {
                    Ok(_) => {}
                    Err(e) if e.is_retryable() => {}
                    Err(e) => warn!(cause = %e, "failed to accept"),
                },
            }
        }

        self.stop().await
    }

    /// Closes the listening socket, then waits for every in-flight exchange to end.
    ///
    /// # Errors
    ///
    /// `NotListening` if the server is not started.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let listener = self.listener.take().ok_or(ServerError::NotListening)?;
        drop(listener);

        let workers = self.slots.drain();
        if !workers.is_empty() {
            info!(connections = workers.len(), "waiting for in-flight connections");
        }

        for (peer, worker) in workers {
            match worker.await {
                Ok(()) => {}
                Err(e) if e.is_panic() => error!(peer = %peer, cause = %e, "connection handler panicked"),
                Err(e) => warn!(peer = %peer, cause = %e, "connection worker cancelled"),
            }
        }

        self.slots.clear();
        info!("server stopped");
        Ok(())
    }

    /// Stops the server if it is listening and releases it.
    pub async fn destroy(mut self) -> Result<(), ServerError> {
        if self.is_listening() {
            self.stop().await?;
        }
        Ok(())
    }
}

async fn resolve(host: Option<&str>, port: u16) -> Result<SocketAddrV4, ServerError> {
    let Some(host) = host.filter(|host| !host.is_empty()) else {
        return Ok(SocketAddrV4::new(DEFAULT_HOST, port));
    };

    let mut addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        debug!(host, cause = %e, "can't resolve host");
        ServerError::invalid_address(host)
    })?;

    addrs
        .find_map(|addr| match addr {
            SocketAddr::V4(addr) => Some(addr),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| ServerError::invalid_address(host))
}

async fn reject(mut stream: TcpStream) {
    if let Err(e) = stream.shutdown().await {
        debug!(cause = %e, "failed to shut down rejected connection");
    }
}

/// Serves one connection: runs the handler over both sides of the exchange, then
/// flushes the response and closes the connection. The slot is freed when `guard` drops.
async fn serve<H>(stream: TcpStream, peer: SocketAddr, guard: SlotGuard, handler: Arc<H>, config: ServerConfig)
where
    H: Handler,
{
    let _guard = guard;
    let (reader, writer) = stream.into_split();
    let mut input = InputMessage::with_config(reader, config.buffer_size(), config.read_timeout());
    let mut output = OutputMessage::with_capacity(writer, config.buffer_size());

    handler.call(&mut input, &mut output).await;

    if let Err(e) = output.flush().await {
        warn!(peer = %peer, cause = %e, "failed to flush response");
    }
    if let Err(e) = output.shutdown().await {
        warn!(peer = %peer, cause = %e, "failed to shut down connection");
    }

    debug!(peer = %peer, request = ?input.state(), status = %output.status(), "connection finished");
}
