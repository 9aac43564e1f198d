use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Lt,
    Contains,
    NotContains,
    Empty,
    NotEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gt,
    Eq,
    Lt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeType {
    Files,
    Sheets,
}

/// Which rows a rule consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Original,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ProcessOp {
    Add {
        col: String,
    },
    #[serde(rename = "cmp")]
    Compare {
        col1: String,
        col2: String,
        #[serde(rename = "cmpType")]
        cmp: CompareOp,
    },
}

/// A rule body. Columns hold letters when built by the form and resolved
/// column names once the mapper has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Rule {
    Filter {
        col: String,
        op: FilterOp,
        value: String,
    },
    Sort {
        col: String,
        order: SortOrder,
    },
    Process(ProcessOp),
    Merge {
        #[serde(rename = "mergeType")]
        merge_type: MergeType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    #[serde(flatten)]
    pub rule: Rule,
    #[serde(rename = "dataSource", default)]
    pub data_source: DataSource,
}

impl RuleDescriptor {
    pub fn new(rule: Rule, data_source: DataSource) -> Self {
        Self { rule, data_source }
    }

    pub fn is_merge(&self) -> bool {
        matches!(self.rule, Rule::Merge { .. })
    }
}

impl Rule {
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Filter { .. } => "filter",
            Rule::Sort { .. } => "sort",
            Rule::Process(ProcessOp::Add { .. }) => "process/add",
            Rule::Process(ProcessOp::Compare { .. }) => "process/cmp",
            Rule::Merge { .. } => "merge",
        }
    }

    /// Rewrites every column reference through `map`.
    pub fn map_columns<F>(&self, mut map: F) -> Result<Rule, RuleError>
    where
        F: FnMut(&str) -> Result<String, RuleError>,
    {
        Ok(match self {
            Rule::Filter { col, op, value } => Rule::Filter {
                col: map(col)?,
                op: *op,
                value: value.clone(),
            },
            Rule::Sort { col, order } => Rule::Sort {
                col: map(col)?,
                order: *order,
            },
            Rule::Process(ProcessOp::Add { col }) => Rule::Process(ProcessOp::Add { col: map(col)? }),
            Rule::Process(ProcessOp::Compare { col1, col2, cmp }) => {
                Rule::Process(ProcessOp::Compare {
                    col1: map(col1)?,
                    col2: map(col2)?,
                    cmp: *cmp,
                })
            }
            Rule::Merge { merge_type } => Rule::Merge {
                merge_type: *merge_type,
            },
        })
    }
}

macro_rules! keyword_enum {
    ($ty:ty { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = RuleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($variant),)+
                    other => Err(RuleError::Validation(format!(
                        "unknown {} `{other}`",
                        stringify!($ty)
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant {
                    return f.write_str($text);
                })+
                Ok(())
            }
        }
    };
}

keyword_enum!(FilterOp {
    "eq" => FilterOp::Eq,
    "neq" => FilterOp::Neq,
    "gt" => FilterOp::Gt,
    "lt" => FilterOp::Lt,
    "contains" => FilterOp::Contains,
    "notcontains" => FilterOp::NotContains,
    "empty" => FilterOp::Empty,
    "notempty" => FilterOp::NotEmpty,
});

keyword_enum!(SortOrder {
    "asc" => SortOrder::Asc,
    "desc" => SortOrder::Desc,
});

keyword_enum!(CompareOp {
    "gt" => CompareOp::Gt,
    "eq" => CompareOp::Eq,
    "lt" => CompareOp::Lt,
});

keyword_enum!(MergeType {
    "files" => MergeType::Files,
    "sheets" => MergeType::Sheets,
});

keyword_enum!(DataSource {
    "original" => DataSource::Original,
    "previous" => DataSource::Previous,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_json_uses_wire_field_names() {
        let descriptor: RuleDescriptor = serde_json::from_str(
            r#"{"type":"process","op":"cmp","col1":"A","col2":"B","cmpType":"gt","dataSource":"previous"}"#,
        )
        .expect("compare descriptor should parse");

        assert_eq!(
            descriptor,
            RuleDescriptor::new(
                Rule::Process(ProcessOp::Compare {
                    col1: "A".to_string(),
                    col2: "B".to_string(),
                    cmp: CompareOp::Gt,
                }),
                DataSource::Previous,
            )
        );

        let filter: RuleDescriptor = serde_json::from_str(
            r#"{"type":"filter","col":"C","op":"notcontains","value":"x","dataSource":"original"}"#,
        )
        .expect("filter descriptor should parse");
        assert_eq!(
            filter.rule,
            Rule::Filter {
                col: "C".to_string(),
                op: FilterOp::NotContains,
                value: "x".to_string(),
            }
        );
    }

    #[test]
    fn merge_descriptor_serializes_merge_type() {
        let descriptor = RuleDescriptor::new(
            Rule::Merge {
                merge_type: MergeType::Sheets,
            },
            DataSource::Original,
        );
        let json = serde_json::to_value(&descriptor).expect("descriptor should serialize");

        assert_eq!(json["type"], "merge");
        assert_eq!(json["mergeType"], "sheets");
        assert_eq!(json["dataSource"], "original");
    }

    #[test]
    fn keywords_parse_and_print() {
        assert_eq!("notempty".parse::<FilterOp>(), Ok(FilterOp::NotEmpty));
        assert_eq!(FilterOp::NotContains.to_string(), "notcontains");
        assert_eq!(" desc ".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("between".parse::<CompareOp>().is_err());
    }
}
