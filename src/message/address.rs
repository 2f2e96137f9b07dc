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

use std::{fmt::Display, net::IpAddr, str::FromStr};

use email_address::EmailAddress;
use mail_parser::{Addr, Address, HeaderValue, MessageParser};

/// A single RFC 5322 mailbox, `Display Name <user@domain>` or `user@domain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// No address where one was expected.
    Empty,
    /// The address has no `@` separator.
    MissingAt,
    /// Invalid local part.
    InvalidUser,
    /// Invalid domain.
    InvalidDomain,
    /// A list where a single mailbox was expected.
    ExpectedSingle,
}

impl Display for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressError::Empty => write!(f, "no address"),
            AddressError::MissingAt => write!(f, "missing @ in addr-spec"),
            AddressError::InvalidUser => write!(f, "invalid local part"),
            AddressError::InvalidDomain => write!(f, "invalid domain"),
            AddressError::ExpectedSingle => write!(f, "expected a single address"),
        }
    }
}

impl std::error::Error for AddressError {}

impl Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "\"{}\" <{}>", name.replace('"', "\\\""), self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl FromStr for Mailbox {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_mailbox(s)
    }
}

/// Parses a single mailbox, as found in a `From` header.
pub fn parse_mailbox(value: &str) -> Result<Mailbox, AddressError> {
    let mut list = parse_mailbox_list(value)?;
    match list.len() {
        0 => Err(AddressError::Empty),
        1 => Ok(list.remove(0)),
        _ => Err(AddressError::ExpectedSingle),
    }
}

/// Parses an address list, as found in a `To` header. Members of groups are
/// returned in order, an empty group contributes no mailbox.
pub fn parse_mailbox_list(value: &str) -> Result<Vec<Mailbox>, AddressError> {
    if value.trim().is_empty() {
        return Err(AddressError::Empty);
    }

    let raw = format!("To: {}\r\n\r\n", value.trim());
    let message = MessageParser::default()
        .parse(raw.as_bytes())
        .ok_or(AddressError::Empty)?;
    let header = message.headers().first().ok_or(AddressError::Empty)?;

    match &header.value {
        HeaderValue::Address(Address::List(list)) => list.iter().map(to_mailbox).collect(),
        HeaderValue::Address(Address::Group(groups)) => groups
            .iter()
            .flat_map(|group| group.addresses.iter())
            .map(to_mailbox)
            .collect(),
        HeaderValue::Empty => Ok(Vec::new()),
        _ => Err(AddressError::MissingAt),
    }
}

fn to_mailbox(addr: &Addr<'_>) -> Result<Mailbox, AddressError> {
    let email = match addr.address.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => check_addr_spec(email)?,
        _ if addr.name.is_some() => return Err(AddressError::MissingAt),
        _ => return Err(AddressError::Empty),
    };

    Ok(Mailbox {
        name: addr
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        email,
    })
}

fn check_addr_spec(addr: &str) -> Result<String, AddressError> {
    if addr.is_empty() {
        return Err(AddressError::Empty);
    }
    let (user, domain) = addr.rsplit_once('@').ok_or(AddressError::MissingAt)?;

    if !EmailAddress::is_valid_local_part(user) {
        return Err(AddressError::InvalidUser);
    }

    let ip = domain
        .strip_prefix('[')
        .and_then(|ip| ip.strip_suffix(']'))
        .unwrap_or(domain);
    if !EmailAddress::is_valid_domain(domain) && ip.parse::<IpAddr>().is_err() {
        return Err(AddressError::InvalidDomain);
    }

    Ok(addr.to_string())
}
