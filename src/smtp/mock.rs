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

//! Scripted single-connection SMTP server used by the session tests.
//! Every line received is recorded; message content is recorded as one entry
//! following the `DATA` command.

use std::net::SocketAddr;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

pub(crate) struct MockServer {
    pub addr: SocketAddr,
    session: JoinHandle<Vec<String>>,
}

#[derive(Clone)]
pub(crate) struct MockServerBuilder {
    ehlo_reply: &'static str,
    auth_reply: &'static str,
}

impl MockServer {
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder {
            ehlo_reply: "250-mock.example.com\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n",
            auth_reply: "235 2.7.0 Authentication successful\r\n",
        }
    }

    pub async fn start() -> Self {
        Self::builder().start().await
    }

    /// Waits for the client to disconnect and returns every line received.
    pub async fn transcript(self) -> Vec<String> {
        self.session.await.unwrap()
    }
}

impl MockServerBuilder {
    pub fn ehlo_reply(mut self, reply: &'static str) -> Self {
        self.ehlo_reply = reply;
        self
    }

    pub fn auth_reply(mut self, reply: &'static str) -> Self {
        self.auth_reply = reply;
        self
    }

    pub async fn start(self) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let session = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            self.serve(stream).await
        });

        MockServer { addr, session }
    }

    async fn serve(self, stream: TcpStream) -> Vec<String> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut transcript = Vec::new();
        let mut in_auth = false;
        let mut line = Vec::new();

        if writer
            .write_all(b"220 mock.example.com ESMTP ready\r\n")
            .await
            .is_err()
        {
            return transcript;
        }

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => (),
            }
            let command = String::from_utf8_lossy(&line).trim_end().to_string();
            let verb = command
                .split(' ')
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            transcript.push(command);

            let reply = if in_auth {
                in_auth = false;
                if verb == "*" {
                    "501 5.7.0 Authentication cancelled\r\n"
                } else {
                    "235 2.7.0 Authentication successful\r\n"
                }
            } else {
                match verb.as_str() {
                    "EHLO" => self.ehlo_reply,
                    "AUTH" => {
                        in_auth = self.auth_reply.starts_with("334");
                        self.auth_reply
                    }
                    "MAIL" => "250 2.1.0 Ok\r\n",
                    "RCPT" => "250 2.1.5 Ok\r\n",
                    "DATA" => {
                        if writer
                            .write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
                            .await
                            .is_err()
                        {
                            break;
                        }
                        let mut data = Vec::new();
                        loop {
                            line.clear();
                            match reader.read_until(b'\n', &mut line).await {
                                Ok(0) | Err(_) => return transcript,
                                Ok(_) if line == b".\r\n" => break,
                                Ok(_) => data.extend_from_slice(&line),
                            }
                        }
                        transcript.push(String::from_utf8_lossy(&data).into_owned());
                        "250 2.0.0 Ok: queued\r\n"
                    }
                    "QUIT" => {
                        let _ = writer.write_all(b"221 2.0.0 Bye\r\n").await;
                        break;
                    }
                    _ => "502 5.5.2 Command not recognized\r\n",
                }
            };

            if writer.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }

        transcript
    }
}
