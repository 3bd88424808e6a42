//! Initialisation du logging `tracing`
//!
//! Le filtre de niveau est rechargeable : le [`LogHandle`] retourné par
//! [`init_logging`] permet de changer le niveau minimum sans redémarrer.

use pmoconfig::get_config;
use std::sync::{Arc, RwLock};
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Options de configuration du logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Niveau minimum ("ERROR", "WARN", "INFO", "DEBUG", "TRACE")
    pub min_level: String,
    /// Affiche les logs sur la console
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: "INFO".to_string(),
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    /// Lit les options depuis `host.logger` dans la configuration globale
    pub fn from_config() -> Self {
        let config = get_config();
        Self {
            min_level: config.get_log_min_level(),
            enable_console: config.get_log_enable_console(),
        }
    }
}

/// Handle permettant de modifier le niveau de log à chaud
#[derive(Clone)]
pub struct LogHandle {
    max_level: Arc<RwLock<Level>>,
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    pub fn set_max_level(&self, level: Level) {
        if let Err(e) = self.reload_handle.reload(LevelFilter::from_level(level)) {
            tracing::warn!("Failed to reload log level filter: {}", e);
            return;
        }
        *self.max_level.write().unwrap_or_else(|p| p.into_inner()) = level;
        tracing::info!("Log level changed to: {}", level);
    }

    pub fn max_level(&self) -> Level {
        *self.max_level.read().unwrap_or_else(|p| p.into_inner())
    }
}

/// Installe le subscriber global
///
/// Retourne `None` si un subscriber global est déjà installé (tests, binaire
/// qui a déjà initialisé `tracing`).
pub fn init_logging(options: LoggingOptions) -> Option<LogHandle> {
    let level = string_to_level(&options.min_level).unwrap_or(Level::INFO);
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(level));

    let console = options.enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });

    // Le filtre doit être appliqué avant la sortie console
    let result = Registry::default().with(filter).with(console).try_init();

    match result {
        Ok(()) => Some(LogHandle {
            max_level: Arc::new(RwLock::new(level)),
            reload_handle,
        }),
        Err(e) => {
            eprintln!("Logging already initialized: {}", e);
            None
        }
    }
}

pub fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}
