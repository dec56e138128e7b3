//! The `bind` configuration object.
//!
//! A bind declares one listening endpoint of a frontend. Its on-disk form is
//! a single `bind <address>[:<port>] [options...]` directive; the structured
//! form here is what callers read and write.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lowest port a bind may listen on.
pub const MIN_PORT: u64 = 1;
/// Highest port a bind may listen on.
pub const MAX_PORT: u64 = 65535;

/// A listening endpoint inside a frontend section.
///
/// Optional attributes are `None` when absent from the directive; absence is
/// preserved through encode/decode and never collapses to a zero value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bind {
    /// Identity of the bind within its frontend.
    pub name: String,

    /// Network address, or a filesystem socket path starting with `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,

    /// Process set the bind is restricted to (e.g. `1/2`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ssl: bool,

    /// Path to the certificate used when `ssl` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_certificate: Option<String>,

    /// Path to the CA file used to verify client certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_cafile: Option<String>,

    /// TCP user timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_user_timeout: Option<u64>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub transparent: bool,
}

impl Bind {
    /// A bind on `address:port` named `name`, with every other attribute unset.
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: Option<u64>) -> Self {
        Self {
            name: name.into(),
            address: Some(address.into()),
            port,
            ..Default::default()
        }
    }

    /// The `address[:port]` token this bind is written as.
    pub fn endpoint(&self) -> String {
        let address = self.address.as_deref().unwrap_or_default();
        match self.port {
            Some(port) => format!("{address}:{port}"),
            None => address.to_string(),
        }
    }

    /// Whether the address is a filesystem socket path.
    pub fn is_socket(&self) -> bool {
        self.address.as_deref().is_some_and(|a| a.starts_with('/'))
    }

    /// Check the bind against the object schema.
    ///
    /// The endpoint is written as `address[:port]` and split on the first
    /// colon when read back, so a network address may not contain one and a
    /// socket path may not carry a port.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_token("name", &self.name)?;
        if self.address.is_none() && self.port.is_none() {
            return Err(ValidationError::new("address", "address or port is required"));
        }
        if let Some(address) = &self.address {
            require_token("address", address)?;
            if self.is_socket() {
                if self.port.is_some() {
                    return Err(ValidationError::new("port", "a socket path takes no port"));
                }
            } else if address.contains(':') {
                return Err(ValidationError::new(
                    "address",
                    "must not contain ':' unless it is a socket path",
                ));
            }
        }
        if let Some(port) = self.port {
            if !(MIN_PORT..=MAX_PORT).contains(&port) {
                return Err(ValidationError::new(
                    "port",
                    format!("{port} is outside {MIN_PORT}..={MAX_PORT}"),
                ));
            }
        }
        if let Some(process) = &self.process {
            require_token("process", process)?;
        }
        if let Some(crt) = &self.ssl_certificate {
            require_token("ssl_certificate", crt)?;
        }
        if let Some(ca) = &self.ssl_cafile {
            require_token("ssl_cafile", ca)?;
        }
        Ok(())
    }
}

/// Values end up as single whitespace-separated tokens on disk.
fn require_token(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(field, "must not contain whitespace"));
    }
    Ok(())
}
