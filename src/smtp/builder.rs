/*
 * Copyright Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::{io, time::Duration};

use smtp_proto::EhloResponse;
use tokio::net::{lookup_host, TcpStream};

use crate::{config::Network, Config, SmtpClient, SmtpClientBuilder};

use super::{
    stream::SmtpStream,
    tls::{build_tls_connector, handshake},
    AssertReply,
};

impl SmtpClientBuilder {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        SmtpClientBuilder {
            timeout: Duration::from_secs(60),
            hostname: hostname.into(),
            port,
            network: "tcp".to_string(),
            tls_implicit: false,
            allow_invalid_certs: false,
            local_host: gethostname::gethostname()
                .to_str()
                .unwrap_or("[127.0.0.1]")
                .to_string(),
        }
    }

    /// Allow invalid TLS certificates
    pub fn allow_invalid_certs(mut self, allow_invalid_certs: bool) -> Self {
        self.allow_invalid_certs = allow_invalid_certs;
        self
    }

    /// Start the connection in TLS
    pub fn implicit_tls(mut self, tls_implicit: bool) -> Self {
        self.tls_implicit = tls_implicit;
        self
    }

    /// Network type used to dial: `tcp`, `tcp4` or `tcp6`
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Set the EHLO hostname
    pub fn helo_host(mut self, host: impl Into<String>) -> Self {
        self.local_host = host.into();
        self
    }

    /// Sets the SMTP connection timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Dials the server, reads the greeting and sends EHLO.
    pub async fn connect(&self) -> crate::Result<SmtpClient<SmtpStream, EhloResponse<String>>> {
        tokio::time::timeout(self.timeout, async {
            let mut client = SmtpClient {
                stream: self.dial().await?,
                timeout: self.timeout,
                capabilities: (),
            };

            // Read greeting
            client.read().await?.assert_positive_completion()?;

            // Send EHLO
            let capabilities = client.ehlo(&self.local_host).await?;

            Ok(SmtpClient {
                stream: client.stream,
                timeout: client.timeout,
                capabilities,
            })
        })
        .await
        .map_err(|_| crate::Error::Timeout)?
    }

    /// Opens the transport without speaking SMTP.
    pub async fn dial(&self) -> crate::Result<SmtpStream> {
        let network: Network = self.network.parse()?;
        log::debug!(
            "Dialing {}:{}:{} (tls: {})",
            self.network,
            self.hostname,
            self.port,
            self.tls_implicit
        );

        let mut last_err = None;
        let mut stream = None;
        for addr in lookup_host((self.hostname.as_str(), self.port))
            .await?
            .filter(|addr| network.accepts(addr))
        {
            match TcpStream::connect(addr).await {
                Ok(connected) => {
                    stream = Some(connected);
                    break;
                }
                Err(err) => {
                    log::debug!("Failed to connect to {addr}: {err}");
                    last_err = Some(err);
                }
            }
        }

        let stream = match (stream, last_err) {
            (Some(stream), _) => stream,
            (None, Some(err)) => return Err(err.into()),
            (None, None) => {
                return Err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!(
                        "no {} address found for {}",
                        self.network, self.hostname
                    ),
                )
                .into())
            }
        };

        if self.tls_implicit {
            let tls_connector = build_tls_connector(self.allow_invalid_certs);
            Ok(SmtpStream::Tls(Box::new(
                handshake(&tls_connector, &self.hostname, stream).await?,
            )))
        } else {
            Ok(SmtpStream::Basic(stream))
        }
    }
}

impl From<&Config> for SmtpClientBuilder {
    fn from(config: &Config) -> Self {
        let builder = SmtpClientBuilder::new(config.host.as_str(), config.port)
            .network(config.datagram.as_str())
            .implicit_tls(config.tls)
            .allow_invalid_certs(config.allow_invalid_certs)
            .timeout(config.timeout);

        match &config.helo_host {
            Some(host) => builder.helo_host(host.as_str()),
            None => builder,
        }
    }
}
