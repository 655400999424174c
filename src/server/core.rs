use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::auth::UserDatabase;
use crate::client::handle_client;
use crate::config::ServerConfig;
use crate::error::FtpServerError;
use crate::protocol::responses::{self, Reply};
use crate::server::{ServerContext, ShutdownSignal};

/// Control-connection listener.
pub struct Server {
    listener: TcpListener,
    context: Arc<ServerContext>,
    permits: Arc<Semaphore>,
}

impl Server {
    /// Validates the configuration, provisions user roots and binds the
    /// control listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, FtpServerError> {
        config.validate()?;

        let users = UserDatabase::provision(&config)?;
        let bind_ip = config.bind_ip()?;

        let listener = match TcpListener::bind((bind_ip, config.control_port)).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}:{}: {}", bind_ip, config.control_port, e);
                return Err(e.into());
            }
        };
        info!("Server bound to {}", listener.local_addr()?);

        let permits = Arc::new(Semaphore::new(config.max_clients));
        let context = Arc::new(ServerContext::new(config, users, ShutdownSignal::new()));

        Ok(Self {
            listener,
            context,
            permits,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// State shared with sessions; lets callers run extra sessions over
    /// other transports.
    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.context)
    }

    /// Handle that stops `run` when triggered.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.context.shutdown.clone()
    }

    /// Accepts connections until the shutdown signal fires.
    pub async fn run(self) -> Result<(), FtpServerError> {
        info!(
            "Starting sandftp server on {} (max {} clients, {} users)",
            self.listener.local_addr()?,
            self.context.config.max_clients,
            self.context.users.len()
        );

        let shutdown = self.context.shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.triggered() => {
                    info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.dispatch(stream, addr),
                    Err(e) => error!("Error accepting connection: {}", e),
                },
            }
        }

        Ok(())
    }

    /// Spawns a session task, or turns the client away when all permits
    /// are taken.
    fn dispatch(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Rejecting {}: connection limit reached", peer_addr);
                tokio::spawn(reject_busy(stream));
                return;
            }
        };

        let local_addr = match stream.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Dropping {}: cannot read local address: {}", peer_addr, e);
                return;
            }
        };

        let context = Arc::clone(&self.context);
        // Spawn a task for each client so accept loop doesn't block
        tokio::spawn(async move {
            handle_client(stream, peer_addr, local_addr, context).await;
            drop(permit);
        });
    }
}

async fn reject_busy(mut stream: TcpStream) {
    let reply = Reply::new(
        responses::SERVICE_UNAVAILABLE,
        "Too many connections. Try again later.",
    );
    let _ = stream.write_all(reply.to_string().as_bytes()).await;
    let _ = stream.shutdown().await;
}
