//! Best-effort lookup of the deployment's public address.
//!
//! A single GET to an IP-echo service. Whatever it answers is used verbatim
//! as the `honey_ip` of dispatched sessions. Any failure leaves the address
//! unset and is only reported as a warning.

use std::time::Duration;

use crate::configuration::types::MonitorSettings;
use crate::error_handling::types::ResolverError;
use crate::reporting::Reporter;

pub struct PublicAddressResolver {
    client: reqwest::Client,
    endpoint: String,
    reporter: Reporter,
}

impl PublicAddressResolver {
    pub fn new(
        endpoint: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
        reporter: Reporter,
    ) -> Result<Self, ResolverError> {
        // the echoed address must be this host's own egress address
        let client = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(|e| ResolverError::ClientBuildFailed(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            reporter,
        })
    }

    pub fn from_settings(settings: &MonitorSettings, reporter: Reporter) -> Result<Self, ResolverError> {
        Self::new(
            settings.public_ip_endpoint.clone(),
            settings.connect_timeout(),
            settings.read_timeout(),
            reporter,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issues the request once. Never retries.
    pub async fn resolve(&self) -> Option<String> {
        let response = match self.client.get(&self.endpoint).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                self.reporter.warn(format_args!(
                    "Could not fetch public ip from {} ({}): {}",
                    self.endpoint, reason, e
                ));
                return None;
            }
        };

        if !response.status().is_success() {
            self.reporter.warn(format_args!(
                "Could not fetch public ip from {}: status {}",
                self.endpoint,
                response.status()
            ));
            return None;
        }

        match response.text().await {
            Ok(address) => {
                self.reporter
                    .info(format_args!("Fetched {} as external ip for Hive.", address));
                Some(address)
            }
            Err(e) => {
                self.reporter.warn(format_args!(
                    "Could not read public ip from {}: {}",
                    self.endpoint, e
                ));
                None
            }
        }
    }
}
