use crate::domain::entities::rule::{
    CompareOp, DataSource, FilterOp, MergeType, ProcessOp, Rule, RuleDescriptor, SortOrder,
};
use crate::error::RuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleKind {
    #[default]
    Filter,
    Sort,
    Add,
    Compare,
    Merge,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Filter,
        RuleKind::Sort,
        RuleKind::Add,
        RuleKind::Compare,
        RuleKind::Merge,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RuleKind::Filter => "filter",
            RuleKind::Sort => "sort",
            RuleKind::Add => "add",
            RuleKind::Compare => "cmp",
            RuleKind::Merge => "merge",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RuleKind::Filter => "篩選",
            RuleKind::Sort => "排序",
            RuleKind::Add => "欄位加總",
            RuleKind::Compare => "兩欄比對",
            RuleKind::Merge => "合併表格",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

pub fn filter_op_label(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Eq => "等於",
        FilterOp::Neq => "不等於",
        FilterOp::Gt => "大於",
        FilterOp::Lt => "小於",
        FilterOp::Contains => "包含",
        FilterOp::NotContains => "不包含",
        FilterOp::Empty => "為空",
        FilterOp::NotEmpty => "不為空",
    }
}

/// Raw selections of the rule panel. `build` turns them into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleForm {
    pub kind: RuleKind,
    pub data_source: DataSource,
    pub col: String,
    pub col2: String,
    pub filter_op: FilterOp,
    pub value: String,
    pub order: SortOrder,
    pub cmp: CompareOp,
    pub merge_type: MergeType,
}

impl Default for RuleForm {
    fn default() -> Self {
        Self {
            kind: RuleKind::default(),
            data_source: DataSource::Original,
            col: String::new(),
            col2: String::new(),
            filter_op: FilterOp::Eq,
            value: String::new(),
            order: SortOrder::Asc,
            cmp: CompareOp::Gt,
            merge_type: MergeType::Files,
        }
    }
}

fn pick_column(selected: &str, letters: &[String], field: &str) -> Result<String, RuleError> {
    let selected = selected.trim();
    if selected.is_empty() {
        return Err(RuleError::Validation(format!("{field} must be selected")));
    }
    if !letters.iter().any(|letter| letter == selected) {
        return Err(RuleError::Validation(format!("unknown column `{selected}`")));
    }
    Ok(selected.to_string())
}

impl RuleForm {
    /// Validates the selections against the column letters currently offered.
    pub fn build(&self, letters: &[String]) -> Result<RuleDescriptor, RuleError> {
        let rule = match self.kind {
            RuleKind::Filter => Rule::Filter {
                col: pick_column(&self.col, letters, "column")?,
                op: self.filter_op,
                value: self.value.clone(),
            },
            RuleKind::Sort => Rule::Sort {
                col: pick_column(&self.col, letters, "column")?,
                order: self.order,
            },
            RuleKind::Add => Rule::Process(ProcessOp::Add {
                col: pick_column(&self.col, letters, "column")?,
            }),
            RuleKind::Compare => {
                let col1 = pick_column(&self.col, letters, "first column")?;
                let col2 = pick_column(&self.col2, letters, "second column")?;
                if col1 == col2 {
                    return Err(RuleError::Validation(
                        "compare columns must differ".to_string(),
                    ));
                }
                Rule::Process(ProcessOp::Compare {
                    col1,
                    col2,
                    cmp: self.cmp,
                })
            }
            RuleKind::Merge => Rule::Merge {
                merge_type: self.merge_type,
            },
        };
        Ok(RuleDescriptor::new(rule, self.data_source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> Vec<String> {
        ["A", "B", "C"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compare_with_same_column_is_rejected() {
        let form = RuleForm {
            kind: RuleKind::Compare,
            col: "A".to_string(),
            col2: "A".to_string(),
            ..RuleForm::default()
        };
        assert_eq!(
            form.build(&letters()),
            Err(RuleError::Validation("compare columns must differ".to_string()))
        );
    }

    #[test]
    fn missing_or_unknown_column_is_rejected() {
        let form = RuleForm {
            kind: RuleKind::Sort,
            ..RuleForm::default()
        };
        assert!(matches!(form.build(&letters()), Err(RuleError::Validation(_))));

        let form = RuleForm {
            kind: RuleKind::Filter,
            col: "D".to_string(),
            ..RuleForm::default()
        };
        assert!(matches!(form.build(&letters()), Err(RuleError::Validation(_))));
    }

    #[test]
    fn builds_descriptor_with_data_source() {
        let form = RuleForm {
            kind: RuleKind::Filter,
            data_source: DataSource::Previous,
            col: "B".to_string(),
            filter_op: FilterOp::Contains,
            value: "台北".to_string(),
            ..RuleForm::default()
        };
        let descriptor = form.build(&letters()).expect("form should build");

        assert_eq!(descriptor.data_source, DataSource::Previous);
        assert_eq!(
            descriptor.rule,
            Rule::Filter {
                col: "B".to_string(),
                op: FilterOp::Contains,
                value: "台北".to_string(),
            }
        );
    }

    #[test]
    fn merge_needs_no_columns() {
        let form = RuleForm {
            kind: RuleKind::Merge,
            merge_type: MergeType::Sheets,
            ..RuleForm::default()
        };
        let descriptor = form.build(&[]).expect("merge should build");
        assert!(descriptor.is_merge());
    }

    #[test]
    fn kind_keys_round_trip() {
        for kind in RuleKind::ALL {
            assert_eq!(RuleKind::from_key(kind.key()), Some(kind));
        }
    }
}
