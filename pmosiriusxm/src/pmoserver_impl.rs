//! Implémentation du trait SiriusXmServerExt pour pmoserver::Server

use crate::api_rest::{create_router, SiriusXmState};
use crate::client::SiriusXmClient;
use crate::config_ext::SiriusXmConfigExt;
use crate::models::Credentials;
use crate::pmoserver_ext::SiriusXmServerExt;
use anyhow::Result;
use pmoserver::Server;
use tracing::info;

impl SiriusXmServerExt for Server {
    async fn init_siriusxm_client(&mut self, credentials: Credentials) -> Result<SiriusXmClient> {
        info!("Initializing SiriusXM client for user: {}", credentials.username);

        let config = pmoconfig::get_config();
        let client = SiriusXmClient::from_config(&config, credentials)?;
        client.connect().await?;

        let bitrate = config.get_sxm_bitrate();
        let router = create_router(SiriusXmState::new(client.clone(), bitrate));
        self.add_router("/", router).await;

        info!("SiriusXM proxy ready, serving {} streams", bitrate);
        Ok(client)
    }

    async fn init_siriusxm_client_configured(&mut self) -> Result<SiriusXmClient> {
        info!("Initializing SiriusXM client from configuration");

        let credentials = Credentials::from_env()?;
        self.init_siriusxm_client(credentials).await
    }
}
