use stencil_server::config::{ServerConfig, StoreBackend};
use stencil_server::repository::TemplateRepository;
use stencil_server::server::TemplateServer;
use stencil_server::service::TemplateApi;
use stencil_server::{shutdown, telemetry};
use stencil_storage::{DocumentStore, MemoryStore, S3Store};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = ServerConfig::from_env()?;
    telemetry::init(config.log_format).map_err(|e| eyre::eyre!(e))?;

    let store: Box<dyn DocumentStore> = match &config.store {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, templates will not survive a restart");
            Box::new(MemoryStore::new())
        }
        StoreBackend::S3(options) => {
            tracing::info!(
                bucket = %options.bucket,
                endpoint = options.endpoint_url.as_deref().unwrap_or("aws"),
                "using S3 store"
            );
            Box::new(S3Store::connect(options).await)
        }
    };

    let api = TemplateApi::new(TemplateRepository::new(store.as_ref()));
    let server = TemplateServer::bind(&config).await?;
    server.serve(api, shutdown::shutdown_signal()).await?;

    Ok(())
}
