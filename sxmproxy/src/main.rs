use pmoconfig::get_config;
use pmoserver::{LoggingOptions, ServerBuilder};
use pmosiriusxm::{SiriusXmConfigExt, SiriusXmServerExt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Infrastructure ==========
    let config = get_config();

    let mut server = ServerBuilder::new_configured().build();
    server.init_logging(LoggingOptions::from_config());

    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;

    // ========== PHASE 2 : Client SiriusXM ==========
    info!("📻 Connecting to SiriusXM...");
    let client = server.init_siriusxm_client_configured().await?;
    info!(
        "✅ Session ready for {} ({} streams)",
        client.auth().username(),
        config.get_sxm_bitrate()
    );

    // ========== PHASE 3 : Démarrage du serveur ==========
    info!("🌐 Starting HTTP server...");
    server.start().await?;

    let info = server.info();
    info!("✅ Proxy listening on http://{}:{}", info.base_url, info.http_port);
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
