use securefetch::client::SecureClient;
use securefetch::config::{load_config, print_schema};
use securefetch::session::RequestOptions;
use securefetch::utils::logger::init_logging;
use tracing::{error, info};

// -- Entrypoint
//
// A smoke harness around the session layer: loads config.yaml, builds the
// client, and probes the configured backend with one authenticated read.

#[tokio::main]
async fn main() {
    // `--schema` prints the config JSON schema and exits.
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = load_config();
    init_logging(&config.logging);

    let client = SecureClient::from_config(&config);
    if !client.store().is_authenticated() {
        info!("No stored session found; the probe will run unauthenticated");
    }

    let target = config.api.url("/member/search?name=a");
    match client.secure_request(&target, RequestOptions::get()).await {
        Ok(Some(response)) => info!("Backend replied with status {}", response.status()),
        Ok(None) => error!("Session was terminated during the probe"),
        Err(e) => error!("Probe failed: {}", e),
    }
}
