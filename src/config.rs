//! Generator Settings
//!
//! Everything the generator needs besides the variables themselves: output
//! file names, identifiers used in the generated Rust module, the build
//! target and the application version. Settings are an explicit value built
//! by the caller; nothing here is global.
//!
//! Settings are read from `configure.toml` next to the project (or a file
//! given with `--settings`) and then overridden by command-line flags.
//!
//! ```toml
//! makefile = "config.mk"
//! rust_config = "src/app_config.rs"
//! struct_name = "AppConfig"
//! const_name = "APP_CONFIG"
//! target = "myapp"
//! version = [1, 4, 2]
//!
//! [variables]
//! prefix = "/opt/myapp"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigureError, Result};
use crate::schema::is_rust_identifier;

/// Settings file looked up when none is given explicitly
pub const DEFAULT_SETTINGS_FILE: &str = "configure.toml";

/// Application version, e.g. `[1, 4, 2]`; never empty once validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(Vec<u32>);

impl Version {
    pub fn new(components: Vec<u32>) -> Result<Self> {
        let version = Self(components);
        version.validate()?;
        Ok(version)
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn major(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn minor(&self) -> Option<u32> {
        self.0.get(1).copied()
    }

    pub fn micro(&self) -> Option<u32> {
        self.0.get(2).copied()
    }

    fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(ConfigureError::InvalidVersion {
                version: String::new(),
                reason: "at least one component is required".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Version {
    fn default() -> Self {
        Self(vec![0, 1])
    }
}

/// Dot-separated form, e.g. `1.4.2`
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ConfigureError;

    fn from_str(s: &str) -> Result<Self> {
        let components = s
            .trim()
            .split('.')
            .map(|part| {
                part.parse::<u32>().map_err(|e| ConfigureError::InvalidVersion {
                    version: s.to_string(),
                    reason: format!("component '{}': {}", part, e),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(components)
    }
}

/// Generator settings
///
/// Paths are relative to the output directory. An empty path disables the
/// corresponding artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Generated Makefile fragment
    pub makefile: PathBuf,

    /// Wrapper created next to the fragment (only if absent) that includes it
    pub include_makefile: PathBuf,

    /// Generated Rust module; `.rs` is appended when missing
    pub rust_config: PathBuf,

    /// Name of the generated struct
    pub struct_name: String,

    /// Name of the generated constant instance
    pub const_name: String,

    /// Build target; deduced from the output directory name when unset
    pub target: Option<String>,

    pub version: Version,

    /// Raw variable overrides
    pub variables: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            makefile: PathBuf::from("config.mk"),
            include_makefile: PathBuf::from("Makefile"),
            rust_config: PathBuf::from("src/app_config.rs"),
            struct_name: "AppConfig".to_string(),
            const_name: "APP_CONFIG".to_string(),
            target: None,
            version: Version::default(),
            variables: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigureError::Settings {
            path: path.to_path_buf(),
            reason: format!("Failed to read settings file: {}", e),
        })?;

        Self::parse(&content, path)
    }

    /// Load settings if `path` exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| ConfigureError::Settings {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check identifiers and version
    pub fn validate(&self) -> Result<()> {
        if !is_rust_identifier(&self.struct_name) {
            return Err(ConfigureError::InvalidIdentifier {
                value: self.struct_name.clone(),
                role: "struct name",
            });
        }
        if !is_rust_identifier(&self.const_name) {
            return Err(ConfigureError::InvalidIdentifier {
                value: self.const_name.clone(),
                role: "const name",
            });
        }
        self.version.validate()
    }

    /// Rust module path with the `.rs` extension enforced, `None` if disabled
    pub fn rust_config_path(&self) -> Option<PathBuf> {
        if self.rust_config.as_os_str().is_empty() {
            return None;
        }
        let mut path = self.rust_config.clone();
        if path.extension().is_none_or(|ext| ext != "rs") {
            let mut name = path.file_name().unwrap_or_default().to_os_string();
            name.push(".rs");
            path.set_file_name(name);
        }
        Some(path)
    }

    /// Makefile fragment path, `None` if disabled
    pub fn makefile_path(&self) -> Option<&Path> {
        (!self.makefile.as_os_str().is_empty()).then_some(self.makefile.as_path())
    }

    /// Build target, falling back to the base name of `dir`
    pub fn resolve_target(&self, dir: &Path) -> Result<String> {
        if let Some(target) = self.target.as_deref().filter(|t| !t.is_empty()) {
            return Ok(target.to_string());
        }

        dir.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .ok_or_else(|| ConfigureError::TargetUnknown {
                path: dir.to_path_buf(),
            })
    }
}
