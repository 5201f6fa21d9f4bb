//! Parsing of `--transform` directives and `--rename` maps.
//!
//! A directive reads `DEST=FUNC:SRC[;SRC...]`; the `DEST:FUNC=SRC` spelling
//! is accepted too. LOOKUP takes one source column and a lookup file:
//! `Category=LOOKUP:Description;categories.csv`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::column::ColumnSpec;
use crate::error::{DirectiveError, DirectiveResult};
use crate::parser::parse_list;

static DEST_EQ_FUNC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)=(\w+):(.+)$").expect("valid directive regex"));

static DEST_COLON_FUNC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+):(\w+)=(.+)$").expect("valid directive regex"));

/// The closed set of transformation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransformFunction {
    /// First non-empty value across the sources.
    Merge,
    /// Absolute value of negative numbers.
    Neg,
    /// Zero and positive numbers.
    Pos,
    /// Longest-substring match against a key/value table.
    Lookup,
}

impl TransformFunction {
    pub const ALL: [TransformFunction; 4] = [
        TransformFunction::Merge,
        TransformFunction::Neg,
        TransformFunction::Pos,
        TransformFunction::Lookup,
    ];

    /// Case-insensitive tag lookup.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.tag().eq_ignore_ascii_case(tag))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            TransformFunction::Merge => "MERGE",
            TransformFunction::Neg => "NEG",
            TransformFunction::Pos => "POS",
            TransformFunction::Lookup => "LOOKUP",
        }
    }
}

impl fmt::Display for TransformFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One parsed transform directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformDirective {
    /// Destination column name.
    pub dest: String,
    pub function: TransformFunction,
    /// Source columns, in directive order.
    pub sources: Vec<ColumnSpec>,
    /// LOOKUP table path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_file: Option<PathBuf>,
}

impl TransformDirective {
    pub fn parse(text: &str) -> DirectiveResult<Self> {
        let mut unknown_tag = None;

        for re in [&*DEST_EQ_FUNC, &*DEST_COLON_FUNC] {
            let Some(caps) = re.captures(text) else {
                continue;
            };
            let tag = &caps[2];
            match TransformFunction::from_tag(tag) {
                Some(function) => return Self::build(text, &caps[1], function, &caps[3]),
                None => {
                    unknown_tag.get_or_insert_with(|| tag.to_string());
                }
            }
        }

        Err(match unknown_tag {
            Some(tag) => DirectiveError::UnknownFunction(tag),
            None => DirectiveError::InvalidFormat(text.to_string()),
        })
    }

    fn build(
        text: &str,
        dest: &str,
        function: TransformFunction,
        sources: &str,
    ) -> DirectiveResult<Self> {
        let parts: Vec<&str> = sources.split(';').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(DirectiveError::InvalidFormat(text.to_string()));
        }

        let (sources, lookup_file) = match function {
            TransformFunction::Lookup => {
                if parts.len() != 2 {
                    return Err(DirectiveError::WrongArity {
                        directive: text.to_string(),
                        function: function.to_string(),
                        expected: "exactly one source column and one lookup file",
                    });
                }
                (vec![ColumnSpec::parse(parts[0])], Some(PathBuf::from(parts[1])))
            }
            _ => (parts.iter().map(|p| ColumnSpec::parse(p)).collect(), None),
        };

        Ok(Self {
            dest: dest.to_string(),
            function,
            sources,
            lookup_file,
        })
    }
}

impl FromStr for TransformDirective {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TransformDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sources: Vec<String> = self.sources.iter().map(ToString::to_string).collect();
        if let Some(path) = &self.lookup_file {
            sources.push(path.display().to_string());
        }
        write!(f, "{}={}:{}", self.dest, self.function, sources.join(";"))
    }
}

/// Parse a comma-separated list of directives.
pub fn parse_transforms(arg: &str) -> DirectiveResult<Vec<TransformDirective>> {
    parse_list(arg)?
        .iter()
        .map(|d| TransformDirective::parse(d))
        .collect()
}

/// One `OLD:NEW` rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    pub from: ColumnSpec,
    pub to: String,
}

impl FromStr for RenameRule {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((old, new)) if !old.is_empty() && !new.is_empty() && !new.contains(':') => {
                Ok(RenameRule {
                    from: ColumnSpec::parse(old),
                    to: new.to_string(),
                })
            }
            _ => Err(DirectiveError::InvalidRename(s.to_string())),
        }
    }
}

/// Parse a comma-separated list of `OLD:NEW` renames.
pub fn parse_renames(arg: &str) -> DirectiveResult<Vec<RenameRule>> {
    parse_list(arg)?.iter().map(|r| r.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dest_eq_func() {
        let d = TransformDirective::parse("Paid In=POS:Amount").unwrap();
        assert_eq!(d.dest, "Paid In");
        assert_eq!(d.function, TransformFunction::Pos);
        assert_eq!(d.sources, vec![ColumnSpec::Name("Amount".into())]);
        assert_eq!(d.lookup_file, None);
    }

    #[test]
    fn test_parse_dest_colon_func() {
        let d = TransformDirective::parse("Payee:merge=Name;2").unwrap();
        assert_eq!(d.dest, "Payee");
        assert_eq!(d.function, TransformFunction::Merge);
        assert_eq!(
            d.sources,
            vec![ColumnSpec::Name("Name".into()), ColumnSpec::Index(2)]
        );
    }

    #[test]
    fn test_parse_lookup() {
        let d = TransformDirective::parse("Category=LOOKUP:Description;map.csv").unwrap();
        assert_eq!(d.function, TransformFunction::Lookup);
        assert_eq!(d.sources, vec![ColumnSpec::Name("Description".into())]);
        assert_eq!(d.lookup_file, Some(PathBuf::from("map.csv")));
        assert_eq!(d.to_string(), "Category=LOOKUP:Description;map.csv");
    }

    #[test]
    fn test_lookup_arity() {
        let err = TransformDirective::parse("Category=LOOKUP:Description").unwrap_err();
        assert!(matches!(err, DirectiveError::WrongArity { .. }));

        let err = TransformDirective::parse("Category=LOOKUP:A;B;c.csv").unwrap_err();
        assert!(matches!(err, DirectiveError::WrongArity { .. }));
    }

    #[test]
    fn test_unknown_function() {
        let err = TransformDirective::parse("XX=FUNC:Account").unwrap_err();
        assert_eq!(err.to_string(), "'FUNC': invalid transformation");
    }

    #[test]
    fn test_invalid_format() {
        for text in ["Amount", "=POS:Amount", "X=POS:", "X=POS:A;;B"] {
            let err = TransformDirective::parse(text).unwrap_err();
            assert!(
                matches!(err, DirectiveError::InvalidFormat(_)),
                "{}: {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_parse_transform_list_in_order() {
        let directives =
            parse_transforms("\"Net, total=MERGE:A;B\",Withdrawn=NEG:Amount").unwrap();
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].dest, "Net, total");
        assert_eq!(directives[1].dest, "Withdrawn");
        assert_eq!(directives[1].function, TransformFunction::Neg);
    }

    #[test]
    fn test_parse_renames() {
        let renames = parse_renames("Amount:Value,0:When").unwrap();
        assert_eq!(
            renames,
            vec![
                RenameRule { from: ColumnSpec::Name("Amount".into()), to: "Value".into() },
                RenameRule { from: ColumnSpec::Index(0), to: "When".into() },
            ]
        );
    }

    #[test]
    fn test_bad_renames() {
        for arg in ["Amount", "A:B:C", ":B", "A:"] {
            let err = parse_renames(arg).unwrap_err();
            assert!(matches!(err, DirectiveError::InvalidRename(_)), "{}", arg);
        }
    }

    #[test]
    fn test_function_tags() {
        assert_eq!(TransformFunction::from_tag("lookup"), Some(TransformFunction::Lookup));
        assert_eq!(TransformFunction::from_tag("Neg"), Some(TransformFunction::Neg));
        assert_eq!(TransformFunction::from_tag("SUM"), None);
    }
}
