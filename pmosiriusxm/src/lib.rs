//! # pmosiriusxm - Client SiriusXM et proxy HLS
//!
//! Cette crate s'authentifie auprès de l'API web de SiriusXM, résout une entité
//! (chaîne, épisode) en playlists HLS par débit, et expose le flux via un proxy
//! local qui réécrit l'URI des clés de chiffrement pour que leur récupération
//! passe aussi par le proxy.
//!
//! ## Architecture
//!
//! ```text
//! pmosiriusxm/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # SiriusXmClient, point d'entrée haut-niveau
//! │   ├── auth.rs             # AuthManager : chaîne de sessions et token
//! │   ├── stream.rs           # StreamResolver : tune source et manifeste
//! │   ├── gateway.rs          # PlaybackGateway : playlist, segment, clé
//! │   ├── rewrite.rs          # Réécriture des playlists, chemins locaux
//! │   ├── models.rs           # Structures de données
//! │   ├── api/
//! │   │   ├── mod.rs          # Transport HTTP (SxmApi)
//! │   │   ├── auth.rs         # Endpoints de session
//! │   │   ├── catalog.rs      # Bibliothèque, chaînes, podcasts
//! │   │   └── playback.rs     # Tune source et clés
//! │   ├── config_ext.rs       # Extension pmoconfig
//! │   ├── api_rest.rs         # Routes du proxy (feature pmoserver)
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Concurrence
//!
//! - Un seul renouvellement de token à la fois par client : les requêtes qui
//!   trouvent un token expiré attendent le renouvellement en cours.
//! - Un seul `initialize` en vol par couple `(entity_type, entity_id)` : les
//!   appelants concurrents attendent le résultat au lieu de relancer un tune.
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmosiriusxm::{Bitrate, Credentials, SiriusXmClient, rewrite_playlist};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SiriusXmClient::new(Credentials::from_env()?)?;
//!     client.connect().await?;
//!
//!     for channel in client.get_channels().await?.iter().take(5) {
//!         println!("{} {}", channel.id, channel.title);
//!     }
//!
//!     let playlist = client
//!         .get_playlist("channel-linear", "9450", Bitrate::K256)
//!         .await?;
//!     println!("{}", rewrite_playlist(&playlist, "channel-linear", "9450")?);
//!     Ok(())
//! }
//! ```
//!
//! ## Intégration pmoserver
//!
//! Avec la feature `pmoserver`, [`SiriusXmServerExt`] ajoute les routes du proxy
//! à un `pmoserver::Server`.

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
pub mod models;
pub mod rewrite;
pub mod stream;

#[cfg(feature = "pmoconfig")]
pub mod config_ext;

#[cfg(feature = "pmoserver")]
pub mod api_rest;

#[cfg(feature = "pmoserver")]
pub mod pmoserver_ext;

#[cfg(feature = "pmoserver")]
mod pmoserver_impl;

pub use api::SxmApi;
pub use auth::{AuthManager, AuthPhase};
pub use client::{ClientBuilder, SiriusXmClient};
pub use error::{AuthenticationError, Error, Result, TransportCause, TransportError};
pub use gateway::{PlaybackGateway, LINEAR_CHANNEL_TYPE};
pub use models::{AccessToken, Bitrate, Channel, Credentials, PlaybackKey, TuneSource};
pub use rewrite::{key_path, rewrite_playlist, StreamRoute};
pub use stream::{BitrateMap, StreamHandle, StreamResolver, StreamState};

#[cfg(feature = "pmoconfig")]
pub use config_ext::SiriusXmConfigExt;

#[cfg(feature = "pmoserver")]
pub use pmoserver_ext::SiriusXmServerExt;
