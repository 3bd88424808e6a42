//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour créer le serveur HTTP du proxy
//! SiriusXM avec Axum.
//!
//! ## Fonctionnalités
//!
//! - **API de haut niveau** : routes JSON et sous-routers montés dynamiquement
//! - **Configuration** : port et URL de base lus depuis `pmoconfig`
//! - **Logging** : initialisation de `tracing` avec niveau modifiable à chaud
//! - **Arrêt gracieux** : gestion propre de l'arrêt sur Ctrl+C
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use pmoserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "localhost", 8080).build();
//!     server.init_logging(LoggingOptions::default());
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogHandle, LoggingOptions, init_logging};
pub use server::{Server, ServerBuilder, ServerInfo};
