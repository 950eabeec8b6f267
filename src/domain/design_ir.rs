//! The test design document ("IR") shared by generation, persistence and
//! export: a suite header plus ordered test-case rows.

use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

pub const MAX_ASSUMPTIONS: usize = 100;
pub const MAX_ASSUMPTION_LEN: usize = 500;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CoverageLevel {
    Smoke,
    Regression,
    Full,
}

impl CoverageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageLevel::Smoke => "smoke",
            CoverageLevel::Regression => "regression",
            CoverageLevel::Full => "full",
        }
    }
}

impl fmt::Display for CoverageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_assumptions"))]
pub struct DesignSuite {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub coverage_level: CoverageLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// A persisted row: `id` is mandatory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct DesignRow {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[serde(rename = "Case")]
    #[validate(length(min = 1, max = 300))]
    pub case: String,
    #[serde(rename = "Step")]
    #[validate(length(min = 1, max = 5000))]
    pub step: String,
    #[serde(rename = "Expected")]
    #[validate(length(min = 1, max = 5000))]
    pub expected: String,
    #[serde(rename = "Tag")]
    #[validate(length(max = 300))]
    pub tag: String,
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[validate(length(max = 5000))]
    pub remarks: String,
}

/// A row as produced by a model, before identifiers are assigned.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct GeneratedRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub id: Option<String>,
    #[serde(rename = "Case")]
    #[validate(length(min = 1, max = 300))]
    pub case: String,
    #[serde(rename = "Step")]
    #[validate(length(min = 1, max = 5000))]
    pub step: String,
    #[serde(rename = "Expected")]
    #[validate(length(min = 1, max = 5000))]
    pub expected: String,
    #[serde(rename = "Tag")]
    #[validate(length(max = 300))]
    pub tag: String,
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[validate(length(max = 5000))]
    pub remarks: String,
}

impl GeneratedRow {
    pub fn into_row(self, id: String) -> DesignRow {
        DesignRow {
            id,
            case: self.case,
            step: self.step,
            expected: self.expected,
            tag: self.tag,
            priority: self.priority,
            remarks: self.remarks,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct DesignIr {
    #[validate(nested)]
    pub suite: DesignSuite,
    #[validate(length(max = 5000), nested)]
    pub rows: Vec<DesignRow>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct GeneratedIr {
    #[validate(nested)]
    pub suite: DesignSuite,
    #[validate(length(max = 5000), nested)]
    pub rows: Vec<GeneratedRow>,
}

impl GeneratedIr {
    /// Shape-checks an arbitrary JSON value. Strings are trimmed before the
    /// length bounds are applied.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let mut ir: GeneratedIr = serde_json::from_value(value)
            .map_err(|e| AppError::SchemaViolation(e.to_string()))?;
        ir.suite.trim_fields();
        for row in &mut ir.rows {
            trim_in_place(&mut row.case);
            trim_in_place(&mut row.step);
            trim_in_place(&mut row.expected);
            trim_in_place(&mut row.tag);
            trim_in_place(&mut row.remarks);
            if let Some(id) = row.id.as_mut() {
                trim_in_place(id);
            }
        }
        ir.validate()
            .map_err(|e| AppError::SchemaViolation(e.to_string()))?;
        Ok(ir)
    }
}

impl DesignIr {
    /// Shape-checks a document submitted for persistence.
    pub fn normalized(mut self) -> Result<Self> {
        self.suite.trim_fields();
        for row in &mut self.rows {
            trim_in_place(&mut row.id);
            trim_in_place(&mut row.case);
            trim_in_place(&mut row.step);
            trim_in_place(&mut row.expected);
            trim_in_place(&mut row.tag);
            trim_in_place(&mut row.remarks);
        }
        self.validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        Ok(self)
    }
}

impl DesignSuite {
    fn trim_fields(&mut self) {
        trim_in_place(&mut self.name);
        if let Some(assumptions) = self.assumptions.as_mut() {
            for item in assumptions.iter_mut() {
                trim_in_place(item);
            }
        }
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn validate_assumptions(suite: &DesignSuite) -> std::result::Result<(), ValidationError> {
    let Some(assumptions) = suite.assumptions.as_ref() else {
        return Ok(());
    };
    if assumptions.len() > MAX_ASSUMPTIONS {
        return Err(ValidationError::new("too_many_assumptions"));
    }
    let bad_item = assumptions.iter().any(|item| {
        let len = item.chars().count();
        len == 0 || len > MAX_ASSUMPTION_LEN
    });
    if bad_item {
        return Err(ValidationError::new("assumption_length"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generated_row(case: &str, tag: &str) -> serde_json::Value {
        json!({
            "Case": case,
            "Step": "open the page",
            "Expected": "page is shown",
            "Tag": tag,
            "Priority": "High",
            "remarks": ""
        })
    }

    #[test]
    fn test_generated_ir_accepts_minimal_document() {
        let value = json!({
            "suite": {"name": " Login ", "coverage_level": "smoke"},
            "rows": [generated_row("Login", "normal")]
        });
        let ir = GeneratedIr::from_value(value).unwrap();
        assert_eq!(ir.suite.name, "Login");
        assert_eq!(ir.rows.len(), 1);
        assert_eq!(ir.rows[0].priority, Priority::High);
        assert!(ir.rows[0].id.is_none());
    }

    #[test]
    fn test_generated_ir_rejects_bad_priority() {
        let mut row = generated_row("Login", "normal");
        row["Priority"] = json!("Urgent");
        let value = json!({
            "suite": {"name": "Login", "coverage_level": "smoke"},
            "rows": [row]
        });
        assert!(matches!(
            GeneratedIr::from_value(value),
            Err(AppError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_generated_ir_rejects_blank_case() {
        let value = json!({
            "suite": {"name": "Login", "coverage_level": "full"},
            "rows": [generated_row("   ", "normal")]
        });
        assert!(matches!(
            GeneratedIr::from_value(value),
            Err(AppError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_generated_ir_rejects_unknown_fields() {
        let value = json!({
            "suite": {"name": "Login", "coverage_level": "smoke", "owner": "qa"},
            "rows": []
        });
        assert!(GeneratedIr::from_value(value).is_err());
    }

    #[test]
    fn test_generated_ir_rejects_blank_assumption() {
        let value = json!({
            "suite": {"name": "Login", "coverage_level": "smoke", "assumptions": ["ok", "  "]},
            "rows": []
        });
        assert!(matches!(
            GeneratedIr::from_value(value),
            Err(AppError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_persisted_row_requires_id() {
        let value = json!({
            "suite": {"name": "Login", "coverage_level": "regression"},
            "rows": [generated_row("Login", "normal")]
        });
        assert!(serde_json::from_value::<DesignIr>(value).is_err());
    }

    #[test]
    fn test_normalized_rejects_overlong_id() {
        let ir = DesignIr {
            suite: DesignSuite {
                name: "Login".into(),
                coverage_level: CoverageLevel::Smoke,
                assumptions: None,
                notes: None,
            },
            rows: vec![DesignRow {
                id: "x".repeat(65),
                case: "Login".into(),
                step: "s".into(),
                expected: "e".into(),
                tag: String::new(),
                priority: Priority::Low,
                remarks: String::new(),
            }],
        };
        assert!(matches!(
            ir.normalized(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_row_serializes_with_export_column_names() {
        let row = DesignRow {
            id: "row_1".into(),
            case: "C".into(),
            step: "S".into(),
            expected: "E".into(),
            tag: "normal".into(),
            priority: Priority::Medium,
            remarks: "r".into(),
        };
        let value = serde_json::to_value(&row).unwrap();
        for key in ["id", "Case", "Step", "Expected", "Tag", "Priority", "remarks"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["Priority"], "Medium");
    }
}
