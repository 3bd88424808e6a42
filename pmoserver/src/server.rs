//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module fournit une abstraction simple pour créer des serveurs HTTP
//! avec Axum, en cachant la configuration du routage et de l'arrêt.
//!
//! ## Fonctionnalités
//!
//! - **Routes JSON simples** : ajoutez des endpoints avec `add_route()`
//! - **Sous-routers** : montez les routes d'une crate cliente avec `add_router()`
//! - **Gestion gracieuse** : arrêt propre sur Ctrl+C

use crate::logs::{LogHandle, LoggingOptions, init_logging};
use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use pmoconfig::get_config;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tracing::{error, info};

/// Info serveur sérialisable
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
    log_handle: Option<LogHandle>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - Nom d'hôte annoncé (ex: "localhost")
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
            log_handle: None,
        }
    }

    /// Crée un serveur depuis la configuration globale
    pub fn new_configured() -> Self {
        let config = get_config();
        Self::new("PMO-SiriusXM-Proxy", config.get_base_url(), config.get_http_port())
    }

    /// Ajoute une route JSON dynamique
    ///
    /// La closure fournie est appelée à chaque requête GET sur le chemin spécifié.
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// # use pmoserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "localhost", 3000);
    /// server.add_route("/api/status", || async {
    ///     serde_json::json!({"status": "online"})
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).route(path, get(handler));
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let mut r = self.router.write().await;

        *r = if path == "/" {
            std::mem::take(&mut *r).merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            std::mem::take(&mut *r).nest(&normalized, sub_router)
        };
    }

    /// Retourne une copie du router courant
    pub async fn router(&self) -> Router {
        self.router.read().await.clone()
    }

    /// Démarre le serveur HTTP
    ///
    /// Le port est réservé avant de rendre la main, une erreur de bind est
    /// donc remontée à l'appelant. Le service tourne ensuite en tâche de fond
    /// jusqu'à Ctrl+C.
    pub async fn start(&mut self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Cannot bind HTTP port {}", self.http_port))?;

        info!(
            "Server {} running at http://{}:{}",
            self.name, self.base_url, self.http_port
        );

        let router = self.router().await;
        self.join_handle = Some(tokio::spawn(async move {
            let shutdown = async {
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Ctrl+C reçu, arrêt gracieux");
            };

            if let Err(e) = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("HTTP server error: {}", e);
            }
        }));

        Ok(())
    }

    /// Attend la fin du serveur
    ///
    /// Une tâche serveur interrompue par un panic est journalisée.
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            if let Err(e) = h.await {
                error!("HTTP server task failed: {}", e);
            }
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
        }
    }

    /// Initialise le système de logging
    ///
    /// Le handle retourné reste accessible via [`Server::log_handle`] pour
    /// modifier le niveau à chaud.
    pub fn init_logging(&mut self, options: LoggingOptions) -> Option<LogHandle> {
        self.log_handle = init_logging(options);
        self.log_handle.clone()
    }

    /// Handle du filtre de logs, si le logging a été initialisé par ce serveur
    pub fn log_handle(&self) -> Option<&LogHandle> {
        self.log_handle.as_ref()
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
}

impl ServerBuilder {
    /// Crée un nouveau builder
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
        }
    }

    /// Crée un builder depuis la configuration globale
    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: "PMO-SiriusXM-Proxy".to_string(),
            base_url: config.get_base_url(),
            http_port: config.get_http_port(),
        }
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}
