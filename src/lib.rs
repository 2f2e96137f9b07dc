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

//! # smtp-sendmail
//!
//! _smtp-sendmail_ sends e-mail messages through a single SMTP session. It includes the following features:
//!
//! - Parses raw **e-mail** messages in the Internet Message Format (_RFC 5322_) and renders them back with deterministic header order.
//! - Simple Mail Transfer Protocol (**SMTP**; _RFC 5321_) delivery over plain TCP or implicit **TLS**.
//! - SMTP Service Extension for Authentication (_RFC 4954_) using the PLAIN mechanism.
//! - HTML and base64 attachment body parts, with content-sniffed MIME types and `multipart/mixed` assembly.
//! - Message bodies rendered from Tera templates.
//! - Full async (requires Tokio).
//!
//! ## Usage Example
//!
//! Send a raw message through a local relay:
//!
//! ```rust
//!     let config = Config::new("localhost")
//!         .port(2525)
//!         .credentials("john", "p4ssw0rd");
//!
//!     smtp_sendmail::send_mail(
//!         &config,
//!         "From: john@example.com\r\nTo: jane@example.com\r\nSubject: Hi!\r\n\r\nHello, world!",
//!     )
//!     .await
//!     .unwrap();
//! ```
//!
//! Send an HTML message with an attachment over TLS:
//!
//! ```rust
//!     let boundary = generate_boundary();
//!     let body = Multipart::mixed(&boundary)
//!         .html(&read_template_file("./welcome.html", &user)?)
//!         .attachment("./invoice.pdf")?;
//!
//!     let message = Message::new()
//!         .header("From", "John Doe <john@example.com>")
//!         .header("To", "jane@example.com, james@test.com")
//!         .header("Subject", "Welcome")
//!         .multipart(&body);
//!
//!     let config = Config::new("smtp.example.com")
//!         .port(465)
//!         .tls(true)
//!         .credentials("john", "p4ssw0rd");
//!
//!     smtp_sendmail::send(&config, message).await?;
//! ```
//!

pub mod config;
pub mod content;
pub mod message;
pub mod smtp;
pub mod template;

use std::{fmt::Display, time::Duration};

use tokio::io::{AsyncRead, AsyncWrite};

pub use config::{Config, Network};
pub use content::{attached_file, content_html, generate_boundary, Multipart};
pub use message::{
    address::{AddressError, Mailbox},
    headers::Headers,
    Message,
};
pub use smtp::{
    auth::Credentials,
    message::IntoMessage,
    session::{send, send_mail},
    stream::SmtpStream,
};
pub use template::read_template_file;

#[cfg(feature = "builder")]
pub use mail_builder;

#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// TLS error
    Tls(Box<rustls::Error>),

    /// Failure parsing SMTP reply
    UnparseableReply,

    /// Unexpected SMTP reply.
    UnexpectedReply(smtp_proto::Response<String>),

    /// SMTP authentication failure.
    AuthenticationFailed(smtp_proto::Response<String>),

    /// Credentials would be sent in clear text to a remote host.
    InsecureAuth,

    /// Invalid TLS name provided.
    InvalidTLSName,

    /// Network type other than tcp, tcp4 or tcp6.
    UnsupportedNetwork(String),

    /// Malformed sender or recipient address.
    Address(AddressError),

    /// Malformed message header section.
    InvalidMessage,

    /// Missing message sender.
    MissingMailFrom,

    /// Missing message recipients.
    MissingRcptTo,

    /// The server does not support authentication.
    UnsupportedAuthMechanism,

    /// Template parsing or rendering error.
    Template(tera::Error),

    /// Connection timeout.
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;

/// SMTP client session.
pub struct SmtpClient<T: AsyncRead + AsyncWrite, U = ()> {
    pub stream: T,
    pub timeout: Duration,
    pub capabilities: U,
}

/// Dials a server and opens an SMTP session on it.
#[derive(Clone, Debug)]
pub struct SmtpClientBuilder {
    pub timeout: Duration,
    pub hostname: String,
    pub port: u16,
    pub network: String,
    pub tls_implicit: bool,
    pub allow_invalid_certs: bool,
    pub local_host: String,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Tls(err) => Some(err.as_ref()),
            Error::Address(err) => Some(err),
            Error::Template(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Tls(e) => write!(f, "TLS error: {e}"),
            Error::UnparseableReply => write!(f, "Unparseable SMTP reply"),
            Error::UnexpectedReply(e) => write!(f, "Unexpected reply: {} {}", e.code, e.message),
            Error::AuthenticationFailed(e) => {
                write!(f, "Authentication failed: {} {}", e.code, e.message)
            }
            Error::InsecureAuth => write!(f, "Refusing to authenticate over an unencrypted connection"),
            Error::InvalidTLSName => write!(f, "Invalid TLS name provided"),
            Error::UnsupportedNetwork(network) => write!(f, "Unsupported network {network:?}"),
            Error::Address(e) => write!(f, "Invalid address: {e}"),
            Error::InvalidMessage => write!(f, "Malformed message headers"),
            Error::MissingMailFrom => write!(f, "Missing message sender"),
            Error::MissingRcptTo => write!(f, "Missing message recipients"),
            Error::UnsupportedAuthMechanism => {
                write!(f, "The server does not support authentication")
            }
            Error::Template(e) => write!(f, "Template error: {e}"),
            Error::Timeout => write!(f, "Connection timeout"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Self {
        Error::Address(err)
    }
}

impl From<tera::Error> for Error {
    fn from(err: tera::Error) -> Self {
        Error::Template(err)
    }
}
