//! Resolved snapshot - Rust module holding every expanded value
//!
//! Fields are sorted by field name, not by dependency order. Values are
//! written as Rust string literals via `{:?}`, which escapes quotes,
//! backslashes and control characters.

use std::io::{self, Write};

use crate::configure::Configuration;
use crate::schema::{VariableDescriptor, VERSION_FIELD};

pub fn write<W: Write>(out: &mut W, config: &Configuration) -> io::Result<()> {
    let settings = config.settings();

    let mut fields: Vec<&VariableDescriptor> = config.schema().descriptors().iter().collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));

    writeln!(out, "// Generated by configure. Do not edit.")?;
    writeln!(out)?;
    writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq)]")?;
    writeln!(out, "pub struct {} {{", settings.struct_name)?;

    for d in &fields {
        for line in d.description.lines() {
            writeln!(out, "    /// {}", line.trim_end())?;
        }
        writeln!(out, "    pub {}: &'static str,", d.field)?;
        writeln!(out)?;
    }

    writeln!(out, "    /// Application version")?;
    writeln!(out, "    pub {}: &'static [u32],", VERSION_FIELD)?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(
        out,
        "pub const {}: {} = {} {{",
        settings.const_name, settings.struct_name, settings.struct_name
    )?;

    for d in &fields {
        let value = config.expand(&d.name).unwrap_or_default();
        writeln!(out, "    {}: {:?},", d.field, value)?;
    }

    let version: Vec<String> = settings.version.components().iter().map(u32::to_string).collect();
    writeln!(out, "    {}: &[{}],", VERSION_FIELD, version.join(", "))?;
    writeln!(out, "}};")
}
