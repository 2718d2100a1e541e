//! Configuration - one configure run
//!
//! [`Configuration::new`] is pure: it parses every raw value, expands all
//! variables in schema order and computes the emission order.
//! [`Configuration::write_artifacts`] then writes the Rust module and the
//! Makefile fragment under an output directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::emit::{makefile, snapshot};
use crate::engine::{self, DependencySet, Expander, ExpansionRecord, Registry};
use crate::error::{ConfigureError, Result};
use crate::schema::{Schema, Values};
use crate::template::Template;

/// Fully expanded and ordered configuration, ready to be emitted
#[derive(Debug, Clone)]
pub struct Configuration {
    schema: Schema,
    settings: Settings,
    target: String,
    registry: Registry,
    records: FxHashMap<String, ExpansionRecord>,
    order: Vec<String>,
}

impl Configuration {
    /// Expand `values` and compute the dependency order
    pub fn new(schema: Schema, values: &Values, settings: Settings, target: impl Into<String>) -> Self {
        let registry = Registry::from_values(values.iter());

        let mut expander = Expander::new(&registry);
        let deps = expander.expand_all();
        let order = engine::order(&registry, &deps);
        let records = expander.into_records();

        debug!(variables = registry.len(), "configuration expanded");

        Self {
            schema,
            settings,
            target: target.into(),
            registry,
            records,
            order,
        }
    }

    /// Fully expanded value of `name`
    pub fn expand(&self, name: &str) -> Option<&str> {
        self.records.get(name).map(ExpansionRecord::value)
    }

    /// Transitive dependencies of `name`
    pub fn dependencies(&self, name: &str) -> Option<&DependencySet> {
        self.records.get(name).map(ExpansionRecord::deps)
    }

    /// Parsed, unexpanded template of `name`
    pub fn template(&self, name: &str) -> Option<&Template> {
        self.registry.get(name).map(|v| &v.template)
    }

    /// Variable names with dependencies first
    pub fn emission_order(&self) -> &[String] {
        &self.order
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Render the Rust configuration module
    pub fn write_rust_config<W: Write>(&self, out: &mut W) -> io::Result<()> {
        snapshot::write(out, self)
    }

    /// Render the Makefile fragment
    pub fn write_makefile<W: Write>(&self, out: &mut W) -> io::Result<()> {
        makefile::write(out, self)
    }

    /// Write every enabled artifact below `dir`, returning the paths written
    #[instrument(skip(self), fields(target = %self.target))]
    pub fn write_artifacts(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        if let Some(relative) = self.settings.rust_config_path() {
            let path = dir.join(relative);
            write_file(&path, |out| self.write_rust_config(out))?;
            info!(path = %path.display(), "wrote Rust configuration");
            written.push(path);
        }

        if let Some(relative) = self.settings.makefile_path() {
            let path = dir.join(relative);
            write_file(&path, |out| self.write_makefile(out))?;
            make_executable(&path)?;
            info!(path = %path.display(), "wrote Makefile fragment");

            let wrapper = self.write_include_makefile(&path)?;
            written.push(path);
            written.extend(wrapper);
        }

        Ok(written)
    }

    /// Create the including Makefile next to `makefile` unless one exists
    fn write_include_makefile(&self, makefile: &Path) -> Result<Option<PathBuf>> {
        let include = &self.settings.include_makefile;
        if include.as_os_str().is_empty() {
            return Ok(None);
        }

        let path = makefile.parent().unwrap_or(Path::new("")).join(include);
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "keeping existing Makefile");
                return Ok(None);
            }
            Err(e) => return Err(ConfigureError::write(&path, e)),
        };

        let base = makefile.file_name().unwrap_or_default().to_string_lossy();
        let mut out = BufWriter::new(file);
        writeln!(out, "include {}", base)
            .and_then(|()| out.flush())
            .map_err(|e| ConfigureError::write(&path, e))?;

        info!(path = %path.display(), "wrote including Makefile");
        Ok(Some(path))
    }
}

fn write_file<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigureError::write(parent, e))?;
    }

    let file = File::create(path).map_err(|e| ConfigureError::write(path, e))?;
    let mut out = BufWriter::new(file);
    render(&mut out)
        .and_then(|()| out.flush())
        .map_err(|e| ConfigureError::write(path, e))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| ConfigureError::write(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
