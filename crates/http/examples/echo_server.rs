use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use http::StatusCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use webster::handler::{Handler, Input, Output};
use webster::protocol::{Event, ReceiveError};
use webster::server::Server;

/// Echoes the request body back, numbering every exchange.
#[derive(Debug, Default)]
struct EchoHandler {
    served: AtomicU64,
}

#[async_trait]
impl Handler for EchoHandler {
    async fn call(&self, input: &mut Input, output: &mut Output) {
        let id = self.served.fetch_add(1, Ordering::Relaxed) + 1;
        let mut body = Vec::new();

        loop {
            match input.wait_event().await {
                Ok(Event::Header { .. }) => {
                    if let Some(header) = input.header() {
                        info!(id, method = %header.method(), uri = %header.uri(), "receiving request");
                    }
                }
                Ok(Event::Body { .. }) => match input.read_data() {
                    Ok(data) => body.extend_from_slice(&data),
                    Err(e) => warn!(id, cause = %e, "can't read body"),
                },
                Ok(Event::Complete) => break,
                Err(ReceiveError::ChunkedBody) => {
                    let _ = output.set_status(StatusCode::NOT_IMPLEMENTED);
                    return;
                }
                Err(e) => {
                    warn!(id, cause = %e, "can't receive request");
                    let _ = output.set_status(StatusCode::BAD_REQUEST);
                    return;
                }
            }
        }

        let result = async {
            output.write_header_field("Content-Type", "application/octet-stream").await?;
            output.write_header_field("Content-Length", &body.len().to_string()).await?;
            output.write_header_field("X-Exchange", &id.to_string()).await?;
            output.write_data(&body).await
        };
        if let Err(e) = result.await {
            error!(id, cause = %e, "can't write response");
        }
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = std::env::args().skip(1);
    let host = args.next();
    let port = args.next().and_then(|port| port.parse().ok()).unwrap_or(8080);

    let mut server = Server::new(32);
    if let Err(e) = server.start(host.as_deref(), port).await {
        error!(cause = %e, "can't start server");
        return;
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(cause = %e, "can't listen for ctrl-c");
        }
    };

    match server.run(Arc::new(EchoHandler::default()), shutdown).await {
        Ok(()) => info!("bye"),
        Err(e) => error!(cause = %e, "server failed"),
    }
}
