//! Certificate-authenticated SOAP client for the CPR registry.

use crate::error::{CprError, TransportError};
use crate::request::LookupRequest;
use crate::response::ResponseDocument;
use reqwest::{Client, Identity, StatusCode, Url};
use roxmltree::Document;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Default SOAP action for the family lookup operation.
pub const DEFAULT_SOAP_ACTION: &str = "callGctpService";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// PKCS#12 client certificate used for mutual TLS.
#[derive(Clone)]
pub struct ClientCertificate {
    pub path: PathBuf,
    pub password: SecretString,
}

impl ClientCertificate {
    pub fn new(path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            password: SecretString::new(password.into()),
        }
    }

    fn load(&self) -> Result<Identity, TransportError> {
        let der = std::fs::read(&self.path).map_err(|e| TransportError::CertificateLoad {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        Identity::from_pkcs12_der(&der, self.password.expose_secret()).map_err(|e| {
            TransportError::CertificateLoad {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })
    }
}

impl std::fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("path", &self.path)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Certificate revocation policy for the registry's server certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationCheck {
    /// No CRL/OCSP lookups. The reference deployment runs this way.
    #[default]
    Disabled,
    /// Not supported by the TLS backend; rejected when the client is built.
    Enabled,
}

/// Per-phase bounds on a registry call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    /// TCP connect and TLS handshake.
    ///
    /// Runs inside the `send` bound, so it only takes effect when shorter
    /// than `send`.
    pub connect: Duration,
    /// Whole request up to the response head: connect, TLS handshake,
    /// writing the envelope and waiting for the status line. A slow
    /// handshake that outlasts this is reported as a `send` timeout.
    pub send: Duration,
    /// Reading the response body.
    pub receive: Duration,
    /// Lifetime of an idle connection before it is closed.
    pub close: Duration,
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_TIMEOUT,
            send: DEFAULT_TIMEOUT,
            receive: DEFAULT_TIMEOUT,
            close: DEFAULT_TIMEOUT,
        }
    }
}

/// Builder for [`CprClient`].
#[derive(Debug)]
pub struct CprClientBuilder {
    endpoint: String,
    certificate: Option<ClientCertificate>,
    timeouts: TransportTimeouts,
    revocation_check: RevocationCheck,
    soap_action: String,
}

impl CprClientBuilder {
    pub fn client_certificate(mut self, certificate: ClientCertificate) -> Self {
        self.certificate = Some(certificate);
        self
    }

    pub fn timeouts(mut self, timeouts: TransportTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn revocation_check(mut self, revocation_check: RevocationCheck) -> Self {
        self.revocation_check = revocation_check;
        self
    }

    pub fn soap_action(mut self, soap_action: impl Into<String>) -> Self {
        self.soap_action = soap_action.into();
        self
    }

    /// Load the certificate and build the HTTP client.
    pub fn build(self) -> Result<CprClient, TransportError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| TransportError::Configuration(format!("invalid endpoint URL: {}", e)))?;

        match self.revocation_check {
            RevocationCheck::Disabled => {
                warn!("Certificate revocation checking is disabled for the CPR registry");
            }
            RevocationCheck::Enabled => {
                return Err(TransportError::Configuration(
                    "revocation checking is not supported by the TLS backend".to_string(),
                ));
            }
        }

        let mut builder = Client::builder()
            .use_native_tls()
            .connect_timeout(self.timeouts.connect)
            .pool_idle_timeout(self.timeouts.close)
            .pool_max_idle_per_host(0);

        match &self.certificate {
            Some(certificate) => {
                builder = builder.identity(certificate.load()?);
                debug!(path = %certificate.path.display(), "Loaded client certificate");
            }
            None => {
                warn!("CPR client built without a client certificate");
            }
        }

        let client = builder.build()?;

        Ok(CprClient {
            client,
            endpoint,
            timeouts: self.timeouts,
            soap_action: self.soap_action,
        })
    }
}

/// Client for the CPR registry family lookup.
///
/// Each call opens its own connection; nothing is pooled or retried.
#[derive(Clone, Debug)]
pub struct CprClient {
    client: Client,
    endpoint: Url,
    timeouts: TransportTimeouts,
    soap_action: String,
}

impl CprClient {
    pub fn builder(endpoint: impl Into<String>) -> CprClientBuilder {
        CprClientBuilder {
            endpoint: endpoint.into(),
            certificate: None,
            timeouts: TransportTimeouts::default(),
            revocation_check: RevocationCheck::default(),
            soap_action: DEFAULT_SOAP_ACTION.to_string(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Perform the lookup and parse the returned GCTP document.
    pub async fn invoke(&self, request: &LookupRequest) -> Result<ResponseDocument, CprError> {
        let raw = self.call(request).await?;
        ResponseDocument::parse(&raw)
    }

    /// Perform the lookup and return the raw GCTP document.
    #[instrument(skip(self, request), fields(endpoint = %self.endpoint))]
    pub async fn call(&self, request: &LookupRequest) -> Result<String, CprError> {
        let send = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", self.soap_action))
            .body(request.to_envelope())
            .send();

        let response = timeout(self.timeouts.send, send)
            .await
            .map_err(|_| TransportError::Timeout {
                phase: "send",
                after: self.timeouts.send,
            })?
            .map_err(|e| self.classify(e, "send", self.timeouts.send))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = %status, "Registry rejected client credentials");
            return Err(TransportError::Handshake(format!(
                "registry rejected client certificate: {}",
                status
            ))
            .into());
        }

        let body = timeout(self.timeouts.receive, response.text())
            .await
            .map_err(|_| TransportError::Timeout {
                phase: "receive",
                after: self.timeouts.receive,
            })?
            .map_err(|e| self.classify(e, "receive", self.timeouts.receive))?;

        debug!(status = %status, bytes = body.len(), "Registry responded");

        unwrap_envelope(&body, status)
    }

    fn classify(&self, e: reqwest::Error, phase: &'static str, after: Duration) -> TransportError {
        if e.is_connect() && e.is_timeout() {
            TransportError::Timeout {
                phase: "connect",
                after: self.timeouts.connect,
            }
        } else if e.is_timeout() {
            TransportError::Timeout { phase, after }
        } else if e.is_connect() {
            TransportError::Handshake(e.to_string())
        } else {
            TransportError::Http(e)
        }
    }
}

/// Pull the GCTP result out of the SOAP response envelope.
fn unwrap_envelope(body: &str, status: StatusCode) -> Result<String, CprError> {
    let doc = match Document::parse(body) {
        Ok(doc) => doc,
        Err(e) if status.is_success() => {
            return Err(CprError::MalformedResponse(format!(
                "invalid SOAP envelope: {}",
                e
            )))
        }
        Err(_) => return Err(remote_fault(status, None).into()),
    };

    if let Some(fault) = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "Fault")
    {
        let message = fault
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "faultstring")
            .and_then(|n| n.text())
            .map(str::trim)
            .map(String::from);
        return Err(remote_fault(status, message).into());
    }

    if !status.is_success() {
        return Err(remote_fault(status, None).into());
    }

    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "result")
        .map(|n| n.text().unwrap_or_default().to_string())
        .ok_or_else(|| CprError::MalformedResponse("SOAP body has no <result>".to_string()))
}

fn remote_fault(status: StatusCode, message: Option<String>) -> TransportError {
    warn!(status = %status, has_fault_text = message.is_some(), "Registry fault");
    TransportError::RemoteFault {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| format!("registry returned HTTP {}", status)),
    }
}
