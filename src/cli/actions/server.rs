use crate::account::settings::AuthSettings;
use crate::api;
use crate::api::delivery::DeliveryWorkerConfig;
use anyhow::Result;

/// Fully-resolved server configuration produced by dispatch.
#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub settings: AuthSettings,
    pub worker: DeliveryWorkerConfig,
}

/// Run the API server until shutdown.
/// # Errors
/// Returns an error if the server fails to start or serve.
pub async fn run(args: Args) -> Result<()> {
    api::new(args.port, args.dsn, args.settings, args.worker).await
}
