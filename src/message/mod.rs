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

pub mod address;
pub mod headers;

use mail_parser::MessageParser;

use crate::content::Multipart;

use self::{
    address::{parse_mailbox, parse_mailbox_list, Mailbox},
    headers::Headers,
};

/// An RFC 5322 message: an ordered header section and a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Message {
    /// Create a new empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw RFC 5322 message. Header values are kept as they appear
    /// in the source, unfolded, and must be valid UTF-8. Everything after the
    /// header section is the body.
    pub fn parse(raw: impl AsRef<[u8]>) -> crate::Result<Self> {
        let raw = raw.as_ref();
        let message = MessageParser::default()
            .parse(raw)
            .ok_or(crate::Error::InvalidMessage)?;

        let mut headers = Headers::new();
        for header in message.headers() {
            let value = raw
                .get(header.offset_start as usize..header.offset_end as usize)
                .ok_or(crate::Error::InvalidMessage)?;
            let value = std::str::from_utf8(value).map_err(|_| crate::Error::InvalidMessage)?;
            headers.append(header.name(), unfold(value));
        }
        if headers.is_empty() {
            return Err(crate::Error::InvalidMessage);
        }

        Ok(Message {
            headers,
            body: raw
                .get(message.root_part().offset_body as usize..)
                .unwrap_or_default()
                .to_vec(),
        })
    }

    /// Appends a header value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the message body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Uses a multipart body, setting the `MIME-Version` and `Content-Type`
    /// headers to match it.
    pub fn multipart(mut self, multipart: &Multipart) -> Self {
        self.headers.set("MIME-Version", ["1.0"]);
        self.headers.set("Content-Type", [multipart.content_type()]);
        self.body = multipart.build().into_bytes();
        self
    }

    /// The sender, parsed from the first `From` value.
    pub fn mail_from(&self) -> crate::Result<Mailbox> {
        let from = self
            .headers
            .get("From")
            .ok_or(crate::Error::MissingMailFrom)?;
        Ok(parse_mailbox(from)?)
    }

    /// The recipients, parsed from the first `To` value. Group members are
    /// included; a list with no mailbox at all is `MissingRcptTo`.
    pub fn rcpt_to(&self) -> crate::Result<Vec<Mailbox>> {
        let to = self.headers.get("To").ok_or(crate::Error::MissingRcptTo)?;
        let rcpts = parse_mailbox_list(to)?;
        if rcpts.is_empty() {
            return Err(crate::Error::MissingRcptTo);
        }
        Ok(rcpts)
    }

    /// Header block, an empty line and the body, as sent after DATA.
    pub fn write_to_vec(&self) -> Vec<u8> {
        let header = self.headers.to_block();
        let mut buf = Vec::with_capacity(header.len() + 2 + self.body.len());
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&self.body);
        buf
    }
}

/// Joins folded lines with a single space.
fn unfold(value: &str) -> String {
    value
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use crate::{message::address::AddressError, Message, Multipart};

    #[test]
    fn parse_raw_message() {
        let message = Message::parse(concat!(
            "From: John Doe <john@example.com>\r\n",
            "To: jane@example.com,\r\n",
            " \"Smith, James\" <james@test.com>\r\n",
            "subject: Hi!\r\n",
            "\r\n",
            "Hello, world!\r\n",
            "\r\n",
            "Bye.\r\n"
        ))
        .unwrap();

        assert_eq!(message.headers.len(), 3);
        assert_eq!(message.headers.get("Subject"), Some("Hi!"));
        assert_eq!(message.body, b"Hello, world!\r\n\r\nBye.\r\n");
        assert_eq!(message.mail_from().unwrap().email, "john@example.com");
        assert_eq!(
            message
                .rcpt_to()
                .unwrap()
                .into_iter()
                .map(|rcpt| rcpt.email)
                .collect::<Vec<_>>(),
            vec!["jane@example.com", "james@test.com"]
        );
    }

    #[test]
    fn parse_line_feed_only() {
        let message =
            Message::parse("From: a@example.com\nTo: b@example.com\n\nhello\nworld").unwrap();
        assert_eq!(message.headers.get("to"), Some("b@example.com"));
        assert_eq!(message.body, b"hello\nworld");

        let message = Message::parse("From: a@example.com\r\nTo: b@example.com").unwrap();
        assert_eq!(message.headers.len(), 2);
        assert!(message.body.is_empty());
    }

    #[test]
    fn parse_keeps_raw_values() {
        let message = Message::parse(concat!(
            "From: a@example.com\r\n",
            "To: b@example.com\r\n",
            "Subject: =?utf-8?q?caf=C3=A9?=\r\n",
            "X-Long: first\r\n",
            "\tsecond\r\n",
            "Received: from a.example.com\r\n",
            "Received: from b.example.com\r\n",
            "\r\n",
            "hello"
        ))
        .unwrap();

        assert_eq!(message.headers.get("Subject"), Some("=?utf-8?q?caf=C3=A9?="));
        assert_eq!(message.headers.get("X-Long"), Some("first second"));
        assert_eq!(
            message.headers.get_all("Received").unwrap(),
            &["from a.example.com", "from b.example.com"]
        );
        assert_eq!(
            message.headers.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["From", "To", "Subject", "X-Long", "Received"]
        );
    }

    #[test]
    fn render_then_parse() {
        let message = Message::new()
            .header("From", "John Doe <john@example.com>")
            .header("To", "jane@example.com, james@example.com")
            .header("Subject", "Quarterly report: draft 2")
            .header("X-Priority", "1")
            .body("hello\r\n");

        let parsed = Message::parse(message.write_to_vec()).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn non_utf8_header_is_rejected() {
        assert!(matches!(
            Message::parse(&b"From: a@example.com\r\nSubject: caf\xe9\r\n\r\nhello"[..]),
            Err(crate::Error::InvalidMessage)
        ));

        let message = Message::parse(&b"From: a@example.com\r\n\r\ncaf\xe9"[..]).unwrap();
        assert_eq!(message.body, b"caf\xe9");
    }

    #[test]
    fn group_recipients() {
        let message = Message::new()
            .header("From", "a@example.com")
            .header("To", "Team: b@example.com, C <c@example.com>;");
        assert_eq!(
            message
                .rcpt_to()
                .unwrap()
                .into_iter()
                .map(|rcpt| rcpt.email)
                .collect::<Vec<_>>(),
            vec!["b@example.com", "c@example.com"]
        );

        let message = message.header("To", "ignored@example.com");
        assert_eq!(message.rcpt_to().unwrap().len(), 2);

        let message = Message::new().header("To", "undisclosed-recipients:;");
        assert!(matches!(message.rcpt_to(), Err(crate::Error::MissingRcptTo)));
    }

    #[test]
    fn parse_invalid() {
        for raw in ["", "\r\nbody only", "Not a header\r\n\r\nbody"] {
            assert!(
                matches!(Message::parse(raw), Err(crate::Error::InvalidMessage)),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn envelope_errors() {
        let message = Message::new().header("To", "b@example.com");
        assert!(matches!(
            message.mail_from(),
            Err(crate::Error::MissingMailFrom)
        ));

        let message = Message::new().header("From", "not-an-address");
        assert!(matches!(
            message.mail_from(),
            Err(crate::Error::Address(AddressError::MissingAt))
        ));
        assert!(matches!(message.rcpt_to(), Err(crate::Error::MissingRcptTo)));
    }

    #[test]
    fn write_message() {
        let message = Message::new()
            .header("From", "a@example.com")
            .header("To", "b@example.com")
            .header("Subject", "hi")
            .body("hello");
        assert_eq!(
            message.write_to_vec(),
            b"From: a@example.com\r\nTo: b@example.com\r\nSubject: hi\r\n\r\nhello"
        );
    }

    #[test]
    fn multipart_message() {
        let multipart = Multipart::mixed("b1").html("<p>Hi</p>");
        let message = Message::new()
            .header("From", "a@example.com")
            .header("Content-Type", "text/plain")
            .multipart(&multipart);

        assert_eq!(message.headers.get("Mime-Version"), Some("1.0"));
        assert_eq!(
            message.headers.get_all("content-type").unwrap(),
            &["multipart/mixed; boundary=\"b1\""]
        );
        assert_eq!(message.body, multipart.build().into_bytes());
    }
}
