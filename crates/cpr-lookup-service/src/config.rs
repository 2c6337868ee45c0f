//! Configuration for the lookup service.

use anyhow::{Context, Result};
use cpr_client::{
    ClientCertificate, CprClient, InvocationContext, RevocationCheck, TransportTimeouts,
    DEFAULT_SOAP_ACTION, FAMILY_SERVICE_UUID,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// CPR registry connection
    pub registry: RegistryConfig,

    /// Invocation context identifiers
    pub service_agreement: ServiceAgreementConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Optional lookup quota
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Registry SOAP endpoint
    pub service_url: String,

    /// PKCS#12 client certificate
    pub cert_path: PathBuf,

    /// Client certificate passphrase
    pub cert_password: SecretString,

    #[serde(default = "default_service_uuid")]
    pub service_uuid: String,

    #[serde(default = "default_soap_action")]
    pub soap_action: String,

    /// Server certificate revocation policy
    #[serde(default)]
    pub revocation_check: RevocationCheck,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub send_timeout: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub receive_timeout: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub close_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAgreementConfig {
    pub uuid: String,
    pub user_uuid: String,
    pub system_uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitConfig {
    /// Lookups per minute across all callers. Unset means unlimited.
    pub global_per_minute: Option<NonZeroU32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of plain text
    #[serde(default)]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_service_uuid() -> String {
    FAMILY_SERVICE_UUID.into()
}

fn default_soap_action() -> String {
    DEFAULT_SOAP_ACTION.into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_source(config::Environment::default().separator("__"))
    }

    /// Build configuration from any `config` source.
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Invocation context sent with every registry request.
    pub fn invocation_context(&self) -> InvocationContext {
        InvocationContext::new(
            &self.service_agreement.uuid,
            &self.service_agreement.user_uuid,
            &self.service_agreement.system_uuid,
        )
        .with_service_uuid(&self.registry.service_uuid)
    }
}

impl RegistryConfig {
    pub fn timeouts(&self) -> TransportTimeouts {
        TransportTimeouts {
            connect: self.connect_timeout,
            send: self.send_timeout,
            receive: self.receive_timeout,
            close: self.close_timeout,
        }
    }

    pub fn client_certificate(&self) -> ClientCertificate {
        ClientCertificate::new(&self.cert_path, self.cert_password.expose_secret().clone())
    }

    /// Build the registry client, loading the client certificate.
    pub fn build_client(&self) -> Result<CprClient> {
        CprClient::builder(&self.service_url)
            .client_certificate(self.client_certificate())
            .timeouts(self.timeouts())
            .revocation_check(self.revocation_check)
            .soap_action(&self.soap_action)
            .build()
            .with_context(|| format!("Failed to create CPR client for {}", self.service_url))
    }
}
