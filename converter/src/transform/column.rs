//! Column specifiers and their resolution to positions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ColumnError, DirectiveResult};
use crate::models::Table;
use crate::parser::parse_list;

/// A reference to a column by name or zero-based index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ColumnSpec {
    Name(String),
    Index(usize),
}

impl ColumnSpec {
    /// A non-empty string of ASCII digits is an index; anything else is a name.
    pub fn parse(s: &str) -> Self {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = s.parse() {
                return ColumnSpec::Index(index);
            }
        }
        ColumnSpec::Name(s.to_string())
    }
}

impl From<&str> for ColumnSpec {
    fn from(s: &str) -> Self {
        ColumnSpec::parse(s)
    }
}

impl From<usize> for ColumnSpec {
    fn from(index: usize) -> Self {
        ColumnSpec::Index(index)
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSpec::Name(name) => f.write_str(name),
            ColumnSpec::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Parse a comma-separated list of column names/indexes.
pub fn parse_column_list(arg: &str) -> DirectiveResult<Vec<ColumnSpec>> {
    Ok(parse_list(arg)?.iter().map(|s| ColumnSpec::parse(s)).collect())
}

/// Resolves [`ColumnSpec`]s against a table's current header.
///
/// Aliases are `(old, new)` name pairs recorded by the rename stage; a name
/// missing from the header is looked up through them, so a renamed column
/// answers to both names.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    table: &'a Table,
    aliases: &'a [(String, String)],
}

impl<'a> ColumnResolver<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table, aliases: &[] }
    }

    pub fn with_aliases(mut self, aliases: &'a [(String, String)]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Resolve one specifier to a zero-based position.
    pub fn resolve(&self, spec: &ColumnSpec) -> Result<usize, ColumnError> {
        match spec {
            ColumnSpec::Index(index) => {
                let width = self.table.width();
                if *index < width {
                    Ok(*index)
                } else {
                    Err(ColumnError::IndexOutOfRange { index: *index, width })
                }
            }
            ColumnSpec::Name(name) => self
                .position_of(name)
                .ok_or_else(|| ColumnError::NotFound { column: name.clone() }),
        }
    }

    /// Resolve a whole list against the same header.
    pub fn resolve_all(&self, specs: &[ColumnSpec]) -> Result<Vec<usize>, ColumnError> {
        specs.iter().map(|spec| self.resolve(spec)).collect()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        let mut current = name;
        // Follows rename chains (A -> B -> C); bounded so cycles terminate.
        for _ in 0..=self.aliases.len() {
            if let Some(pos) = self.table.position(current) {
                return Some(pos);
            }
            current = self
                .aliases
                .iter()
                .find(|(old, _)| old == current)
                .map(|(_, new)| new.as_str())?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn table() -> Table {
        Table::with_header(
            vec!["Date", "Description", "Amount"],
            vec![vec![Cell::from("01/02/2023"), Cell::from("shop"), Cell::Number(-5.0)]],
        )
    }

    #[test]
    fn test_spec_parsing() {
        assert_eq!(ColumnSpec::parse("2"), ColumnSpec::Index(2));
        assert_eq!(ColumnSpec::parse("Amount"), ColumnSpec::Name("Amount".into()));
        assert_eq!(ColumnSpec::parse("-1"), ColumnSpec::Name("-1".into()));
        assert_eq!(ColumnSpec::parse(""), ColumnSpec::Name(String::new()));
    }

    #[test]
    fn test_parse_column_list_mixes_names_and_indexes() {
        let specs = parse_column_list("Date,2,\"A, B\"").unwrap();
        assert_eq!(
            specs,
            vec![
                ColumnSpec::Name("Date".into()),
                ColumnSpec::Index(2),
                ColumnSpec::Name("A, B".into()),
            ]
        );
    }

    #[test]
    fn test_resolve_matches_header() {
        let table = table();
        let resolver = ColumnResolver::new(&table);
        let specs = parse_column_list("Amount,0,Description").unwrap();
        assert_eq!(resolver.resolve_all(&specs).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn test_unknown_name_fails() {
        let table = table();
        let err = ColumnResolver::new(&table)
            .resolve(&ColumnSpec::Name("Balance".into()))
            .unwrap_err();
        assert_eq!(err, ColumnError::NotFound { column: "Balance".into() });
    }

    #[test]
    fn test_index_out_of_range() {
        let table = table();
        let err = ColumnResolver::new(&table)
            .resolve(&ColumnSpec::Index(3))
            .unwrap_err();
        assert_eq!(err, ColumnError::IndexOutOfRange { index: 3, width: 3 });
    }

    #[test]
    fn test_positional_table_has_no_names() {
        let table = Table::new(vec![None, None], vec![]);
        let resolver = ColumnResolver::new(&table);
        assert_eq!(resolver.resolve(&ColumnSpec::Index(1)).unwrap(), 1);
        assert!(matches!(
            resolver.resolve(&ColumnSpec::Name("0".into())),
            Err(ColumnError::NotFound { .. })
        ));
    }

    #[test]
    fn test_aliases_follow_renames() {
        let mut table = table();
        table.rename_column(2, "Value");
        table.rename_column(2, "Total");
        let aliases = vec![
            ("Amount".to_string(), "Value".to_string()),
            ("Value".to_string(), "Total".to_string()),
        ];
        let resolver = ColumnResolver::new(&table).with_aliases(&aliases);
        assert_eq!(resolver.resolve(&"Amount".into()).unwrap(), 2);
        assert_eq!(resolver.resolve(&"Value".into()).unwrap(), 2);
        assert_eq!(resolver.resolve(&"Total".into()).unwrap(), 2);
        assert!(resolver.resolve(&"Missing".into()).is_err());
    }

    #[test]
    fn test_alias_cycle_terminates() {
        let table = table();
        let aliases = vec![
            ("X".to_string(), "Y".to_string()),
            ("Y".to_string(), "X".to_string()),
        ];
        let resolver = ColumnResolver::new(&table).with_aliases(&aliases);
        assert!(resolver.resolve(&"X".into()).is_err());
    }
}
