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

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine};
use smtp_proto::{EhloResponse, EXT_AUTH};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::SmtpClient;

/// PLAIN authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials<'x> {
    username: Cow<'x, str>,
    secret: Cow<'x, str>,
}

impl<'x> From<(&'x str, &'x str)> for Credentials<'x> {
    fn from(credentials: (&'x str, &'x str)) -> Self {
        Credentials {
            username: credentials.0.into(),
            secret: credentials.1.into(),
        }
    }
}

impl From<(String, String)> for Credentials<'_> {
    fn from(credentials: (String, String)) -> Self {
        Credentials {
            username: credentials.0.into(),
            secret: credentials.1.into(),
        }
    }
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl<'x> Credentials<'x> {
    /// Creates a new `Credentials` instance.
    pub fn new(
        username: impl Into<Cow<'x, str>>,
        secret: impl Into<Cow<'x, str>>,
    ) -> Credentials<'x> {
        Credentials {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Base64 encoded `\0username\0secret` with an empty authorization identity.
    pub(crate) fn encode_plain(&self) -> String {
        STANDARD.encode(format!("\u{0}{}\u{0}{}", self.username, self.secret).as_bytes())
    }
}

/// PLAIN sends the secret in clear text, so it is only used over TLS or
/// against the local machine.
pub fn plain_auth_allowed(server_name: &str, is_tls: bool) -> bool {
    is_tls || matches!(server_name, "localhost" | "127.0.0.1" | "::1")
}

impl<T: AsyncRead + AsyncWrite + Unpin> SmtpClient<T, EhloResponse<String>> {
    /// Authenticates with the PLAIN mechanism, sending the credentials as the
    /// initial response.
    pub async fn authenticate(&mut self, credentials: &Credentials<'_>) -> crate::Result<()> {
        if !self.capabilities.has_capability(EXT_AUTH) {
            return Err(crate::Error::UnsupportedAuthMechanism);
        }

        let reply = self
            .cmd(format!("AUTH PLAIN {}\r\n", credentials.encode_plain()))
            .await?;

        match reply.code {
            235 => {
                log::debug!("Authenticated as {}", credentials.username());
                Ok(())
            }
            334 => {
                // The initial response carries the credentials, a challenge
                // is answered with a cancellation.
                log::warn!("Unexpected server challenge: {}", reply.message);
                Err(crate::Error::AuthenticationFailed(
                    self.cmd(b"*\r\n").await?,
                ))
            }
            _ => Err(crate::Error::AuthenticationFailed(reply)),
        }
    }
}
