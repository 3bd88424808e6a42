//! Extension pour intégrer la configuration SiriusXM dans pmoconfig
//!
//! Les réglages vivent sous `accounts.siriusxm` :
//!
//! ```yaml
//! accounts:
//!   siriusxm:
//!     api_base_url: https://api.edge-gateway.siriusxm.com
//!     web_base_url: https://www.siriusxm.com
//!     request_timeout: 10
//!     bitrate: 256k
//! ```
//!
//! Les identifiants ne sont jamais stockés dans la configuration : voir
//! [`crate::Credentials::resolve`].

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_WEB_BASE_URL};
use crate::models::Bitrate;
use pmoconfig::Config;
use serde_yaml::Value;
use std::time::Duration;
use tracing::warn;

/// Trait d'extension pour lire les réglages SiriusXM depuis pmoconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmosiriusxm::SiriusXmConfigExt;
///
/// let config = get_config();
/// println!("SiriusXM API: {}", config.get_sxm_api_base_url());
/// ```
pub trait SiriusXmConfigExt {
    /// URL de base de l'edge gateway
    fn get_sxm_api_base_url(&self) -> String;

    /// URL de base du site web (page du player)
    fn get_sxm_web_base_url(&self) -> String;

    /// Timeout de chaque requête HTTP (10 s par défaut)
    fn get_sxm_request_timeout(&self) -> Duration;

    /// Débit servi par le proxy (256k par défaut)
    ///
    /// Une valeur inconnue est ignorée avec un avertissement.
    fn get_sxm_bitrate(&self) -> Bitrate;

    /// Modifie le débit servi par le proxy (en mémoire)
    fn set_sxm_bitrate(&self, bitrate: Bitrate) -> anyhow::Result<()>;
}

impl SiriusXmConfigExt for Config {
    fn get_sxm_api_base_url(&self) -> String {
        self.get_string_or(
            &["accounts", "siriusxm", "api_base_url"],
            DEFAULT_API_BASE_URL,
        )
    }

    fn get_sxm_web_base_url(&self) -> String {
        self.get_string_or(
            &["accounts", "siriusxm", "web_base_url"],
            DEFAULT_WEB_BASE_URL,
        )
    }

    fn get_sxm_request_timeout(&self) -> Duration {
        let secs = match self.get_value(&["accounts", "siriusxm", "request_timeout"]) {
            Ok(Value::Number(n)) => n.as_u64().filter(|s| *s > 0),
            Ok(Value::String(s)) => s.trim().parse::<u64>().ok().filter(|s| *s > 0),
            _ => None,
        };
        Duration::from_secs(secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    fn get_sxm_bitrate(&self) -> Bitrate {
        match self.get_value(&["accounts", "siriusxm", "bitrate"]) {
            Ok(Value::String(s)) => s.parse().unwrap_or_else(|_| {
                warn!("Unknown SiriusXM bitrate {:?}, using {}", s, Bitrate::default());
                Bitrate::default()
            }),
            _ => Bitrate::default(),
        }
    }

    fn set_sxm_bitrate(&self, bitrate: Bitrate) -> anyhow::Result<()> {
        self.set_value(
            &["accounts", "siriusxm", "bitrate"],
            Value::String(bitrate.as_str().to_string()),
        )
    }
}
