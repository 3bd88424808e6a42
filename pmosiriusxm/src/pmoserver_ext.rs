//! Extension de pmoserver::Server pour intégrer le proxy SiriusXM
//!
//! `pmoserver` ne connaît pas `pmosiriusxm` : c'est cette crate qui ajoute
//! ses méthodes au serveur via un trait d'extension.

use crate::client::SiriusXmClient;
use crate::models::Credentials;
use anyhow::Result;

/// Trait d'extension pour ajouter le proxy SiriusXM à un serveur pmoserver
///
/// # Exemple
///
/// ```rust,no_run
/// use pmosiriusxm::SiriusXmServerExt;
/// use pmoserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///
///     // Identifiants lus dans SXM_USERNAME / SXM_PASSWORD
///     server.init_siriusxm_client_configured().await?;
///
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait SiriusXmServerExt {
    /// Crée le client, le connecte et enregistre les routes du proxy
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /channels` - Liste des chaînes
    /// - `GET /library` - Bibliothèque de l'utilisateur
    /// - `GET /stream/{type}/{id}/playlist.m3u8` - Playlist réécrite
    /// - `GET /stream/{type}/{id}/key` - Clé de déchiffrement
    /// - `GET /stream/{type}/{id}/{segment}.aac` - Segment audio
    async fn init_siriusxm_client(&mut self, credentials: Credentials) -> Result<SiriusXmClient>;

    /// Même chose avec les réglages de `pmoconfig` et les identifiants
    /// de l'environnement
    async fn init_siriusxm_client_configured(&mut self) -> Result<SiriusXmClient>;
}
