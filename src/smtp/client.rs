/*
 * Copyright Stalwart Labs Ltd.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use smtp_proto::{response::parser::ResponseReceiver, Response};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::SmtpClient;

impl<T: AsyncRead + AsyncWrite + Unpin, U> SmtpClient<T, U> {
    pub(crate) async fn read(&mut self) -> crate::Result<Response<String>> {
        let mut buf = vec![0u8; 1024];
        let mut parser = ResponseReceiver::default();

        loop {
            let br = self.stream.read(&mut buf).await?;

            if br == 0 {
                return Err(crate::Error::UnparseableReply);
            }

            match parser.parse(&mut buf[..br].iter()) {
                Ok(reply) => return Ok(reply),
                Err(err) => match err {
                    smtp_proto::Error::NeedsMoreData { .. } => (),
                    _ => {
                        return Err(crate::Error::UnparseableReply);
                    }
                },
            }
        }
    }

    /// Sends a command to the SMTP server and waits for a reply.
    pub async fn cmd(&mut self, cmd: impl AsRef<[u8]>) -> crate::Result<Response<String>> {
        tokio::time::timeout(self.timeout, async {
            self.stream.write_all(cmd.as_ref()).await?;
            self.stream.flush().await?;
            self.read().await
        })
        .await
        .map_err(|_| crate::Error::Timeout)?
    }

    /// Writes the message content followed by the end-of-data marker.
    /// Bare LF line endings are sent as CRLF and lines starting with a dot
    /// are dot-stuffed.
    pub(crate) async fn write_message(&mut self, message: &[u8]) -> tokio::io::Result<()> {
        // Transparency procedure
        #[derive(Debug)]
        enum State {
            Cr,
            CrLf,
            Init,
        }

        let mut state = State::CrLf;
        let mut last_pos = 0;
        for (pos, byte) in message.iter().enumerate() {
            match byte {
                b'.' if matches!(state, State::CrLf) => {
                    self.stream.write_all(&message[last_pos..pos]).await?;
                    self.stream.write_all(b".").await?;
                    last_pos = pos;
                    state = State::Init;
                }
                b'\r' => state = State::Cr,
                b'\n' => {
                    if !matches!(state, State::Cr) {
                        self.stream.write_all(&message[last_pos..pos]).await?;
                        self.stream.write_all(b"\r").await?;
                        last_pos = pos;
                    }
                    state = State::CrLf;
                }
                _ => state = State::Init,
            }
        }
        self.stream.write_all(&message[last_pos..]).await?;

        let terminator: &[u8] = match state {
            State::CrLf if !message.is_empty() => b".\r\n",
            State::Cr => b"\n.\r\n",
            _ => b"\r\n.\r\n",
        };
        self.stream.write_all(terminator).await?;
        self.stream.flush().await
    }
}
