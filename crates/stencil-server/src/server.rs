use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::RequestLogLayer;
use crate::proto::v1::template_service_server::TemplateServiceServer;
use crate::service::TemplateApi;

/// A bound, not yet serving, gRPC listener.
pub struct TemplateServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    request_timeout: Option<Duration>,
}

impl TemplateServer {
    /// Bind the configured address. Port 0 picks a free port; see
    /// [`TemplateServer::local_addr`].
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = config.listen_addr();
        let bind_error = |source| ServerError::Bind { addr, source };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        Ok(Self {
            listener,
            local_addr,
            request_timeout: config.request_timeout,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `api` until `shutdown` resolves, then stop accepting connections
    /// and let in-flight requests finish.
    pub async fn serve<F>(self, api: TemplateApi, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let mut builder = Server::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        tracing::info!(addr = %self.local_addr, "starting gRPC server");

        builder
            .layer(RequestLogLayer::new())
            .add_service(TemplateServiceServer::new(api))
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), async move {
                shutdown.await;
                tracing::warn!("shutting down gRPC server");
            })
            .await?;

        tracing::info!("gRPC server stopped");
        Ok(())
    }
}
