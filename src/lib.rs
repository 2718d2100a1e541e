//! Configure - configure/make style build settings generator
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           ENGINE                             │
//! │  template/  raw "${name}" strings → Literal/Reference        │
//! │  engine/    Registry, Expander (memoized), order (SCC+Kahn)  │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         GENERATOR                            │
//! │  schema/    variable descriptors, command-line binding       │
//! │  config/    Settings (output files, identifiers, version)    │
//! │  configure/ Configuration: expand, order, write artifacts    │
//! │  emit/      Rust snapshot module, Makefile fragment          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use configure::{Configuration, Schema, Settings};
//!
//! let schema = Schema::standard();
//! let mut values = schema.default_values();
//! values.set("prefix", "/opt/demo").unwrap();
//!
//! let config = Configuration::new(schema, &values, Settings::default(), "demo");
//! assert_eq!(config.expand("bindir"), Some("/opt/demo/bin"));
//! assert_eq!(config.emission_order()[0], "prefix");
//! ```

// ═══════════════════════════════════════════════════════════════
// ENGINE - parsing, expansion, ordering (pure, infallible)
// ═══════════════════════════════════════════════════════════════
pub mod engine;
pub mod template;

// ═══════════════════════════════════════════════════════════════
// GENERATOR - schema, settings, artifacts
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod configure;
pub mod emit;
pub mod schema;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling
// ═══════════════════════════════════════════════════════════════
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use config::{Settings, Version, DEFAULT_SETTINGS_FILE};
pub use configure::Configuration;
pub use engine::{order, DependencyMap, DependencySet, Expander, ExpansionState, Registry, Resolved, Variable};
pub use error::{ConfigureError, FixSuggestion, Result};
pub use schema::{Schema, Values, VariableDescriptor};
pub use template::{parse, Segment, Template};
