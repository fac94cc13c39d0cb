use serde::{Deserialize, Serialize};

/// What `avg` reports for a partition with no present values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptyAverage {
    /// Report `0`, unlike `max`/`min` which report null.
    #[default]
    Zero,
    Null,
}

/// Caller-tunable behavior of a [`crate::Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    #[serde(default)]
    pub empty_average: EmptyAverage,
    /// Joins a column name and an aggregate name into the default output alias,
    /// e.g. `age__sum`.
    #[serde(default = "default_alias_separator")]
    pub alias_separator: String,
}

fn default_alias_separator() -> String {
    "__".to_string()
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            empty_average: EmptyAverage::default(),
            alias_separator: default_alias_separator(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn options_round_trip_through_json() {
        let options = TableOptions {
            empty_average: EmptyAverage::Null,
            alias_separator: "_".to_string(),
        };
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"emptyAverage":"null","aliasSeparator":"_"}"#);
        let parsed: TableOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: TableOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, TableOptions::default());
        assert_eq!(parsed.alias_separator, "__");
        assert_eq!(parsed.empty_average, EmptyAverage::Zero);
    }
}
