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

use crate::{Config, SmtpClientBuilder};

use super::{
    auth::{plain_auth_allowed, Credentials},
    message::IntoMessage,
};

/// Sends a message through a new SMTP session: connect, EHLO, AUTH PLAIN,
/// MAIL FROM, RCPT TO, DATA and QUIT. Any failing step aborts the session
/// and the connection is closed.
pub async fn send(config: &Config, message: impl IntoMessage) -> crate::Result<()> {
    let message = message.into_message()?;

    log::info!(
        "Establish {}:{}:{} SMTP connection",
        config.datagram,
        config.host,
        config.port
    );
    let mut client = SmtpClientBuilder::from(config).connect().await?;

    if !plain_auth_allowed(&config.host, client.stream.is_tls()) {
        return Err(crate::Error::InsecureAuth);
    }
    client
        .authenticate(&Credentials::new(
            config.user.as_str(),
            config.password.as_str(),
        ))
        .await?;

    client.send(message).await?;

    if let Err(err) = client.quit().await {
        log::warn!("Failed to close SMTP session: {err}");
    }
    log::info!("done");

    Ok(())
}

/// Parses a raw RFC 5322 message and sends it.
pub async fn send_mail(config: &Config, raw: &str) -> crate::Result<()> {
    send(config, raw).await
}

#[cfg(test)]
mod test {
    use crate::{smtp::mock::MockServer, Config, Message};

    const MESSAGE: &str = "From: a@example.com\r\nTo: b@example.com\r\nSubject: hi\r\n\r\nhello";

    fn config(host: &str, server: &MockServer) -> Config {
        Config::new(host)
            .port(server.addr.port())
            .credentials("a@example.com", "pass")
            .helo_host("client.example.com")
    }

    #[tokio::test]
    async fn send_full_session() {
        let _ = env_logger::try_init();

        let server = MockServer::start().await;
        super::send_mail(&config("127.0.0.1", &server), MESSAGE)
            .await
            .unwrap();

        assert_eq!(
            server.transcript().await,
            vec![
                "EHLO client.example.com",
                "AUTH PLAIN AGFAZXhhbXBsZS5jb20AcGFzcw==",
                "MAIL FROM:<a@example.com>",
                "RCPT TO:<b@example.com>",
                "DATA",
                "From: a@example.com\r\nTo: b@example.com\r\nSubject: hi\r\n\r\nhello\r\n",
                "QUIT",
            ]
        );
    }

    #[tokio::test]
    async fn send_to_localhost() {
        let server = MockServer::start().await;
        super::send(
            &config("localhost", &server).datagram("tcp4"),
            Message::parse(MESSAGE).unwrap(),
        )
        .await
        .unwrap();

        let transcript = server.transcript().await;
        assert_eq!(transcript.first().unwrap(), "EHLO client.example.com");
        assert_eq!(transcript.last().unwrap(), "QUIT");
        assert!(transcript.contains(&"RCPT TO:<b@example.com>".to_string()));
    }

    #[tokio::test]
    async fn send_to_many() {
        let server = MockServer::start().await;
        super::send_mail(
            &config("127.0.0.1", &server),
            concat!(
                "From: \"A\" <a@example.com>\r\n",
                "To: b@example.com,\r\n",
                "  C <c@example.com>, d@example.com\r\n",
                "\r\n",
                "hello"
            ),
        )
        .await
        .unwrap();

        let rcpts: Vec<String> = server
            .transcript()
            .await
            .into_iter()
            .filter(|line| line.starts_with("RCPT"))
            .collect();
        assert_eq!(
            rcpts,
            vec![
                "RCPT TO:<b@example.com>",
                "RCPT TO:<c@example.com>",
                "RCPT TO:<d@example.com>"
            ]
        );
    }

    #[tokio::test]
    async fn send_to_group() {
        let server = MockServer::start().await;
        super::send_mail(
            &config("127.0.0.1", &server),
            "From: a@example.com\r\nTo: Team: a@example.com, b@example.com;\r\n\r\nhello",
        )
        .await
        .unwrap();

        let rcpts: Vec<String> = server
            .transcript()
            .await
            .into_iter()
            .filter(|line| line.starts_with("RCPT"))
            .collect();
        assert_eq!(
            rcpts,
            vec!["RCPT TO:<a@example.com>", "RCPT TO:<b@example.com>"]
        );
    }

    #[tokio::test]
    async fn invalid_sender() {
        let server = MockServer::start().await;
        let result = super::send_mail(
            &config("127.0.0.1", &server),
            "From: not-an-address\r\nTo: b@example.com\r\n\r\nhello",
        )
        .await;
        assert!(matches!(result, Err(crate::Error::Address(_))));

        let transcript = server.transcript().await;
        assert!(transcript[1].starts_with("AUTH PLAIN"));
        assert!(!transcript
            .iter()
            .any(|line| ["MAIL", "RCPT", "DATA"].iter().any(|verb| line.starts_with(verb))));
    }

    #[tokio::test]
    async fn tls_against_plain_server() {
        let server = MockServer::start().await;
        let result = super::send_mail(&config("127.0.0.1", &server).tls(true), MESSAGE).await;
        assert!(
            matches!(result, Err(crate::Error::Tls(_) | crate::Error::Io(_))),
            "{result:?}"
        );

        let transcript = server.transcript().await;
        assert!(!transcript
            .iter()
            .any(|line| ["EHLO", "AUTH", "MAIL", "RCPT", "DATA"]
                .iter()
                .any(|verb| line.starts_with(verb))));
    }

    #[tokio::test]
    async fn missing_recipients() {
        let server = MockServer::start().await;
        let result = super::send_mail(
            &config("127.0.0.1", &server),
            "From: a@example.com\r\nSubject: hi\r\n\r\nhello",
        )
        .await;
        assert!(matches!(result, Err(crate::Error::MissingRcptTo)));

        let transcript = server.transcript().await;
        assert!(transcript.contains(&"MAIL FROM:<a@example.com>".to_string()));
        assert!(!transcript.iter().any(|line| line.starts_with("RCPT")));
    }
}
