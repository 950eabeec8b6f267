use crate::domain::design_ir::CoverageLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CoverageRule {
    pub level: CoverageLevel,
    pub description: String,
    pub constraints: RuleConstraints,
    pub must_include: Vec<String>,
    pub avoid: Vec<String>,
    pub recommended_tags: Vec<String>,
    pub priority_policy: PriorityPolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleConstraints {
    pub max_steps_per_case: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriorityPolicy {
    pub default: String,
    #[serde(default)]
    pub rules: Vec<PriorityRule>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriorityRule {
    pub condition: String,
    pub priority: String,
}

impl CoverageRule {
    /// Line-oriented rendering injected into the user prompt and kept as the
    /// job's rule snapshot.
    pub fn to_prompt_text(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Coverage level: {}", self.level));
        lines.push(format!("Description: {}", self.description.trim()));
        lines.push("Constraints:".to_string());
        lines.push(format!(
            "  - Max steps per case: {}",
            self.constraints.max_steps_per_case
        ));
        lines.push("Must include:".to_string());
        for item in &self.must_include {
            lines.push(format!("  - {}", item));
        }
        lines.push("Avoid:".to_string());
        for item in &self.avoid {
            lines.push(format!("  - {}", item));
        }
        lines.push(format!(
            "Recommended tags: {}",
            self.recommended_tags.join(", ")
        ));
        lines.push("Priority policy:".to_string());
        lines.push(format!("  Default: {}", self.priority_policy.default));
        for rule in &self.priority_policy.rules {
            lines.push(format!("  - When \"{}\" -> {}", rule.condition, rule.priority));
        }
        lines.join("\n")
    }
}
