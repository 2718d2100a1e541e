//! Variable Schema - statically declared configure variables
//!
//! A schema is an ordered list of [`VariableDescriptor`]s. Each descriptor
//! names a variable (also its `--name` command-line option), documents it,
//! gives its raw default (which may contain `${other}` placeholders) and the
//! Rust field it is stored in inside the generated config module.
//!
//! ## Value precedence (highest to lowest)
//!
//! 1. Command-line options (`--prefix /opt`)
//! 2. Settings file `[variables]` table
//! 3. Descriptor defaults

use clap::{Arg, ArgMatches, Command};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::{ConfigureError, Result};

/// Field name reserved for the application version in the generated struct
pub const VERSION_FIELD: &str = "version";

const HELP_HEADING: &str = "Variables";

/// Rust keywords that cannot be used as plain identifiers
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try", "typeof",
    "unsized", "virtual", "yield",
];

/// Check that `s` can be used verbatim as a Rust identifier
pub fn is_rust_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if s == "_" || RUST_KEYWORDS.contains(&s) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One configure variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDescriptor {
    /// Placeholder name and long option, e.g. `bindir`
    pub name: String,
    /// Field in the generated struct, e.g. `bin_dir`
    pub field: String,
    /// Raw default, e.g. `${execprefix}/bin`
    pub default: String,
    pub description: String,
}

impl VariableDescriptor {
    pub fn new(
        name: impl Into<String>,
        field: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            default: default.into(),
            description: description.into(),
        }
    }
}

/// Ordered, validated list of variable descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    descriptors: Vec<VariableDescriptor>,
}

impl Schema {
    /// Validate names and fields, keeping declaration order
    pub fn new(descriptors: Vec<VariableDescriptor>) -> Result<Self> {
        let mut names: FxHashSet<&str> = FxHashSet::default();
        let mut fields: FxHashSet<&str> = FxHashSet::default();

        for d in &descriptors {
            if !names.insert(d.name.as_str()) {
                return Err(ConfigureError::DuplicateVariable { name: d.name.clone() });
            }

            let invalid = |reason: &str| ConfigureError::InvalidField {
                name: d.name.clone(),
                field: d.field.clone(),
                reason: reason.to_string(),
            };

            if !is_rust_identifier(&d.field) {
                return Err(invalid("not a Rust identifier"));
            }
            if d.field == VERSION_FIELD {
                return Err(invalid("reserved for the application version"));
            }
            if !fields.insert(d.field.as_str()) {
                return Err(invalid("used by another variable"));
            }
        }

        Ok(Self { descriptors })
    }

    /// Standard GNU-style installation directories
    pub fn standard() -> Self {
        let d = VariableDescriptor::new;
        Self {
            descriptors: vec![
                d("prefix", "prefix", "/usr/local", "install architecture-independent files in PREFIX"),
                d("execprefix", "exec_prefix", "${prefix}", "install architecture-dependent files in EPREFIX"),
                d("bindir", "bin_dir", "${execprefix}/bin", "user executables"),
                d("libexecdir", "lib_exec_dir", "${execprefix}/libexec", "program executables"),
                d("sysconfdir", "sys_conf_dir", "${prefix}/etc", "read-only single-machine data"),
                d("libdir", "lib_dir", "${execprefix}/lib", "object code libraries"),
                d("datarootdir", "data_root_dir", "${prefix}/share", "read-only arch.-independent data root"),
                d("datadir", "data_dir", "${datarootdir}", "read-only arch.-independent data"),
                d("mandir", "man_dir", "${datarootdir}/man", "man documentation"),
            ],
        }
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&VariableDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Raw values initialised from the descriptor defaults
    pub fn default_values(&self) -> Values {
        Values {
            entries: self
                .descriptors
                .iter()
                .map(|d| (d.name.clone(), d.default.clone()))
                .collect(),
        }
    }

    /// Add one `--<name> <VALUE>` option per variable.
    ///
    /// Variables whose name clashes with an existing option are skipped with
    /// a warning; they can still be set from the settings file.
    pub fn augment_command(&self, command: Command) -> Command {
        debug!(variables = self.descriptors.len(), "binding variables to command-line options");
        self.descriptors.iter().fold(command, |command, d| {
            let clash = command
                .get_arguments()
                .any(|arg| arg.get_id() == d.name.as_str() || arg.get_long() == Some(d.name.as_str()));
            if clash || d.name == "help" || d.name == "version" {
                warn!(variable = %d.name, "variable name clashes with a built-in option, not exposed");
                return command;
            }

            command.arg(
                Arg::new(d.name.clone())
                    .long(d.name.clone())
                    .value_name("VALUE")
                    .help(format!("{} [default: {}]", d.description, d.default))
                    .help_heading(HELP_HEADING),
            )
        })
    }

    /// Copy every variable given on the command line into `values`
    pub fn read_matches(&self, matches: &ArgMatches, values: &mut Values) -> Result<()> {
        for d in &self.descriptors {
            // Skipped (clashing) variables have no argument registered
            let Ok(Some(raw)) = matches.try_get_one::<String>(&d.name) else {
                continue;
            };
            values.set(&d.name, raw.clone())?;
        }
        Ok(())
    }
}

/// Raw (unexpanded) variable values in schema order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Values {
    entries: Vec<(String, String)>,
}

impl Values {
    /// Replace the raw value of a declared variable
    pub fn set(&mut self, name: &str, raw: impl Into<String>) -> Result<()> {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, value)) => {
                *value = raw.into();
                Ok(())
            }
            None => Err(ConfigureError::UnknownVariable { name: name.to_string() }),
        }
    }

    /// Apply a batch of overrides, e.g. a settings `[variables]` table
    pub fn extend<'a, I>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (name, raw) in overrides {
            self.set(name, raw.as_str())?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// `(name, raw value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_schema_passes_validation() {
        let standard = Schema::standard();
        let validated = Schema::new(standard.descriptors().to_vec()).unwrap();
        assert_eq!(validated, standard);
        assert_eq!(standard.len(), 9);
        assert_eq!(standard.get("bindir").unwrap().field, "bin_dir");
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = Schema::new(vec![
            VariableDescriptor::new("a", "a", "", ""),
            VariableDescriptor::new("a", "b", "", ""),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigureError::DuplicateVariable { name } if name == "a"));
    }

    #[test]
    fn invalid_fields_are_rejected() {
        for field in ["", "1abc", "has-dash", "fn", "_", VERSION_FIELD] {
            let err = Schema::new(vec![VariableDescriptor::new("x", field, "", "")]).unwrap_err();
            assert!(matches!(err, ConfigureError::InvalidField { .. }), "{field}");
        }
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let err = Schema::new(vec![
            VariableDescriptor::new("a", "same", "", ""),
            VariableDescriptor::new("b", "same", "", ""),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigureError::InvalidField { .. }));
    }

    #[test]
    fn identifier_check() {
        assert!(is_rust_identifier("AppConfig"));
        assert!(is_rust_identifier("_private"));
        assert!(is_rust_identifier("APP_CONFIG2"));
        assert!(!is_rust_identifier("2fast"));
        assert!(!is_rust_identifier("struct"));
        assert!(!is_rust_identifier("é"));
    }

    #[test]
    fn values_start_from_defaults() {
        let values = Schema::standard().default_values();
        assert_eq!(values.get("bindir"), Some("${execprefix}/bin"));
        assert_eq!(values.iter().next(), Some(("prefix", "/usr/local")));
    }

    #[test]
    fn setting_unknown_variable_fails() {
        let mut values = Schema::standard().default_values();
        values.set("prefix", "/opt").unwrap();
        assert_eq!(values.get("prefix"), Some("/opt"));

        let err = values.set("nonsense", "x").unwrap_err();
        assert!(matches!(err, ConfigureError::UnknownVariable { .. }));
    }

    #[test]
    fn command_line_overrides_defaults() {
        let schema = Schema::standard();
        let command = schema.augment_command(Command::new("configure"));
        let matches = command
            .try_get_matches_from(["configure", "--prefix", "/opt/app", "--mandir=/usr/share/man"])
            .unwrap();

        let mut values = schema.default_values();
        schema.read_matches(&matches, &mut values).unwrap();
        assert_eq!(values.get("prefix"), Some("/opt/app"));
        assert_eq!(values.get("mandir"), Some("/usr/share/man"));
        assert_eq!(values.get("bindir"), Some("${execprefix}/bin"));
    }

    #[test]
    fn clashing_variable_is_not_exposed() {
        let schema = Schema::new(vec![VariableDescriptor::new("target", "target_dir", "x", "")]).unwrap();
        let command = Command::new("configure").arg(Arg::new("target").long("target"));
        let command = schema.augment_command(command);
        assert_eq!(command.get_arguments().filter(|a| a.get_id() == "target").count(), 1);
    }
}
