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

//! Body part fragments, meant to be concatenated into a message body.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{distributions::Alphanumeric, Rng};

use crate::message::headers::Headers;

/// HTML part with its headers. Newlines, carriage returns and tabs are
/// removed from the markup.
pub fn content_html(html: &str) -> String {
    let mut headers = Headers::new();
    headers.set("Content-Type", ["text/html;", "charset=\"utf-8\""]);
    headers.set("Content-Transfer-Encoding", ["7bit"]);

    let html: String = html
        .chars()
        .filter(|ch| !matches!(ch, '\n' | '\r' | '\t'))
        .collect();

    format!("{}\r\n{}\r\n", headers.to_block(), html)
}

/// Attachment part preceded by its `--boundary` line. The content type is
/// sniffed from the file contents and left empty when unknown.
pub fn attached_file(path: impl AsRef<Path>, boundary: &str) -> crate::Result<String> {
    Ok(format!("--{}\r\n{}", boundary, attachment_part(path.as_ref())?))
}

fn attachment_part(path: &Path) -> crate::Result<String> {
    let contents = std::fs::read(path)?;

    let content_type = match infer::get(&contents) {
        Some(kind) => kind.mime_type(),
        None => {
            log::warn!("Unknown file type for {}", path.display());
            ""
        }
    };
    log::debug!("filetype: {content_type}");

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    let mut headers = Headers::new();
    headers.set("Content-Type", [content_type]);
    headers.set("Content-Transfer-Encoding", ["base64"]);
    headers.set(
        "Content-Disposition",
        ["attachment;".to_string(), format!("filename=\"{filename}\"")],
    );

    Ok(format!(
        "{}\r\n{}",
        headers.to_block(),
        STANDARD.encode(&contents)
    ))
}

/// Random alphanumeric multipart boundary.
pub fn generate_boundary() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// A complete `multipart/mixed` body: each part is preceded by its boundary
/// line and the body ends with the closing boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    boundary: String,
    parts: Vec<String>,
}

impl Multipart {
    pub fn mixed(boundary: impl Into<String>) -> Self {
        Multipart {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value of the top-level `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary=\"{}\"", self.boundary)
    }

    /// Adds a part made of its own headers, an empty line and its content.
    pub fn part(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    pub fn html(self, html: &str) -> Self {
        self.part(content_html(html))
    }

    pub fn text(self, text: &str) -> Self {
        let mut headers = Headers::new();
        headers.set("Content-Type", ["text/plain;", "charset=\"utf-8\""]);
        headers.set("Content-Transfer-Encoding", ["8bit"]);
        self.part(format!("{}\r\n{}", headers.to_block(), text))
    }

    pub fn attachment(self, path: impl AsRef<Path>) -> crate::Result<Self> {
        let part = attachment_part(path.as_ref())?;
        Ok(self.part(part))
    }

    pub fn build(&self) -> String {
        let mut body = String::new();
        for part in &self.parts {
            body.push_str("--");
            body.push_str(&self.boundary);
            body.push_str("\r\n");
            body.push_str(part);
            if !part.ends_with("\r\n") {
                body.push_str("\r\n");
            }
        }
        body.push_str("--");
        body.push_str(&self.boundary);
        body.push_str("--\r\n");
        body
    }
}
