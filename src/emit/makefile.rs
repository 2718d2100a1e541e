//! Makefile fragment - variables in dependency order
//!
//! Each variable is written from its original template with `${name}`
//! rewritten to `$(name)`, so make performs the substitution itself and
//! command-line overrides (`make prefix=/opt`) still propagate.

use std::io::{self, Write};

use crate::configure::Configuration;

const RULES: &str = "\
# Rules
$(TARGET): $(SOURCES_UNIQUE)
\tcargo build --release --bin $(TARGET) && cp target/release/$(TARGET) $@

clean:
\trm -f $(TARGET)

distclean: clean
\tcargo clean

install: $(TARGET)
\tmkdir -p $(DESTDIR)$(bindir) && cp $(TARGET) $(DESTDIR)$(bindir)/$(TARGET)

uninstall:
\trm -f $(DESTDIR)$(bindir)/$(TARGET)

.PHONY: install uninstall distclean clean
";

pub fn write<W: Write>(out: &mut W, config: &Configuration) -> io::Result<()> {
    writeln!(out, "#!/usr/bin/make -f")?;
    writeln!(out)?;
    writeln!(out, "# Variables")?;

    for name in config.emission_order() {
        let body = config.template(name).map(|t| t.to_make_syntax()).unwrap_or_default();
        writeln!(out, "{} = {}", name, body)?;
    }

    let version = &config.settings().version;
    writeln!(out, "version = {}", version)?;
    if let Some(major) = version.major() {
        writeln!(out, "major_version = {}", major)?;
    }
    if let Some(minor) = version.minor() {
        writeln!(out, "minor_version = {}", minor)?;
    }
    if let Some(micro) = version.micro() {
        writeln!(out, "micro_version = {}", micro)?;
    }
    writeln!(out)?;

    writeln!(out, "TARGET = {}", config.target())?;
    writeln!(out)?;
    writeln!(out, "SOURCES ?=")?;
    writeln!(out, "SOURCES += $(wildcard src/*.rs)")?;
    writeln!(out, "SOURCES_UNIQUE = $(sort $(SOURCES))")?;
    writeln!(out)?;

    out.write_all(RULES.as_bytes())
}
