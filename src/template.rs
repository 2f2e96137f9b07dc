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

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

/// Loads the template at `path` and renders it with `data` as context.
///
/// `data` must serialize to a map (a struct or a map type). Referencing a
/// field missing from `data` is an error. Output is not auto-escaped and
/// nothing is cached between calls.
pub fn read_template_file(path: impl AsRef<Path>, data: &impl Serialize) -> crate::Result<String> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let name = path.to_string_lossy();

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(&name, &source)?;

    let rendered = tera.render(&name, &Context::from_serialize(data)?)?;
    log::debug!("Rendered template {} ({} bytes)", path.display(), rendered.len());
    Ok(rendered)
}
