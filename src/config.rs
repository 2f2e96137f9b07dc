/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::{net::SocketAddr, str::FromStr, time::Duration};

use serde::Deserialize;

/// Connection and credential settings for a single send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    /// Wrap the connection in TLS before the SMTP greeting.
    pub tls: bool,
    /// Network type: `tcp`, `tcp4` or `tcp6`.
    pub datagram: String,
    /// Skip certificate chain and hostname verification (dangerous).
    pub allow_invalid_certs: bool,
    pub timeout: Duration,
    /// EHLO identity, defaults to the local hostname.
    pub helo_host: Option<String>,
}

/// Address families accepted when dialing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Tcp,
    Tcp4,
    Tcp6,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 25,
            tls: false,
            datagram: "tcp".to_string(),
            allow_invalid_certs: false,
            timeout: Duration::from_secs(60),
            helo_host: None,
        }
    }
}

impl Config {
    /// Creates a configuration for the given SMTP server.
    pub fn new(host: impl Into<String>) -> Self {
        Config {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Sets the SMTP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the PLAIN authentication credentials.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Connect over implicit TLS.
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the network type used to dial the server.
    pub fn datagram(mut self, datagram: impl Into<String>) -> Self {
        self.datagram = datagram.into();
        self
    }

    /// Disables checking for certificate validity (dangerous and should not be used).
    pub fn allow_invalid_certs(mut self, allow_invalid_certs: bool) -> Self {
        self.allow_invalid_certs = allow_invalid_certs;
        self
    }

    /// Sets the timeout applied to every network step.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the EHLO hostname.
    pub fn helo_host(mut self, host: impl Into<String>) -> Self {
        self.helo_host = Some(host.into());
        self
    }
}

impl Network {
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Network::Tcp => true,
            Network::Tcp4 => addr.is_ipv4(),
            Network::Tcp6 => addr.is_ipv6(),
        }
    }
}

impl FromStr for Network {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            _ => Err(crate::Error::UnsupportedNetwork(s.to_string())),
        }
    }
}
