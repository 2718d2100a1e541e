//! Placeholder Templates - `${name}` splitting
//!
//! A raw configuration value is split once into literal text and references
//! to other variables. There is no escaping and no nesting: `${` followed by
//! any run of characters other than `}` and a closing `}` is a reference,
//! everything else is literal text. Parsing never fails.
//!
//! Example: `"${prefix}/share/${name}"` →
//! `[Reference(prefix), Literal(/share/), Reference(name)]`

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use smallvec::SmallVec;

/// Pre-compiled regex for `${identifier}` where identifier excludes `}`
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").unwrap());

/// Stack-allocated segments: most values have at most a handful of parts
pub type SegmentVec = SmallVec<[Segment; 4]>;

/// One atomic unit of a parsed template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Text copied verbatim
    Literal(String),
    /// `${name}` reference to another variable
    Reference(String),
}

/// Ordered sequence of segments parsed from one raw string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: SegmentVec,
}

/// Split `raw` into literal and reference segments.
///
/// Empty literals between adjacent references are not emitted. A string with
/// no references yields a single literal, even when the string is empty.
pub fn parse(raw: &str) -> Template {
    let mut segments = SegmentVec::new();
    let mut last_end = 0;

    for m in PLACEHOLDER_RE.find_iter(raw) {
        if m.start() > last_end {
            segments.push(Segment::Literal(raw[last_end..m.start()].to_string()));
        }
        // Strip the leading "${" and trailing "}"
        segments.push(Segment::Reference(raw[m.start() + 2..m.end() - 1].to_string()));
        last_end = m.end();
    }

    if segments.is_empty() {
        segments.push(Segment::Literal(raw.to_string()));
    } else if last_end < raw.len() {
        segments.push(Segment::Literal(raw[last_end..].to_string()));
    }

    Template { segments }
}

impl Template {
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names referenced by this template, in order of appearance
    pub fn references(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Reference(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// True when the template holds no references
    pub fn is_literal(&self) -> bool {
        self.references().next().is_none()
    }

    /// Render with every reference rewritten as a make macro, `$(name)`.
    ///
    /// This translates the original template; it does not expand anything.
    pub fn to_make_syntax(&self) -> String {
        let mut out = String::with_capacity(self.segments.len() * 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Reference(name) => {
                    out.push_str("$(");
                    out.push_str(name);
                    out.push(')');
                }
            }
        }
        out
    }
}

/// Displays the template in its original `${name}` form
impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Reference(name) => write!(f, "${{{}}}", name)?,
            }
        }
        Ok(())
    }
}
