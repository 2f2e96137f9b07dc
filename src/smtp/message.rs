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

use tokio::io::{AsyncRead, AsyncWrite};

use crate::{Message, SmtpClient};

pub trait IntoMessage {
    fn into_message(self) -> crate::Result<Message>;
}

impl IntoMessage for Message {
    fn into_message(self) -> crate::Result<Message> {
        Ok(self)
    }
}

impl IntoMessage for &Message {
    fn into_message(self) -> crate::Result<Message> {
        Ok(self.clone())
    }
}

impl IntoMessage for &str {
    fn into_message(self) -> crate::Result<Message> {
        Message::parse(self)
    }
}

impl IntoMessage for String {
    fn into_message(self) -> crate::Result<Message> {
        Message::parse(self)
    }
}

impl IntoMessage for &[u8] {
    fn into_message(self) -> crate::Result<Message> {
        Message::parse(self)
    }
}

#[cfg(feature = "builder")]
impl IntoMessage for mail_builder::MessageBuilder<'_> {
    fn into_message(self) -> crate::Result<Message> {
        Message::parse(self.write_to_vec()?)
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin, U> SmtpClient<T, U> {
    /// Sends a message to the server: MAIL FROM the first `From` mailbox,
    /// RCPT TO each `To` mailbox in order, then DATA with the rendered
    /// header block and body.
    pub async fn send(&mut self, message: impl IntoMessage) -> crate::Result<()> {
        let message = message.into_message()?;

        // Send mail-from
        let from = message.mail_from()?;
        log::info!("Mail from: {}", from.email);
        self.mail_from(&from.email).await?;

        // Send rcpt-to
        for rcpt in message.rcpt_to()? {
            log::info!("Rcpt to: {}", rcpt.email);
            self.rcpt_to(&rcpt.email).await?;
        }

        // Send message
        let body = message.write_to_vec();
        log::debug!("Sending {} bytes of message data", body.len());
        self.data(body).await
    }
}
