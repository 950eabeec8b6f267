use crate::domain::coverage_rule::CoverageRule;
use crate::domain::design_ir::CoverageLevel;
use crate::domain::error::{AppError, Result};
use figment::providers::{Format, Toml};
use figment::Figment;
use std::path::PathBuf;
use tracing::debug;

const SMOKE_RULE: &str = include_str!("../../resources/rules/coverage_smoke.toml");
const REGRESSION_RULE: &str = include_str!("../../resources/rules/coverage_regression.toml");
const FULL_RULE: &str = include_str!("../../resources/rules/coverage_full.toml");

/// Resolves coverage rules: `{rules_dir}/coverage_{level}.toml` when present,
/// the built-in rule otherwise.
#[derive(Debug, Clone, Default)]
pub struct CoverageRuleLoader {
    rules_dir: Option<PathBuf>,
}

impl CoverageRuleLoader {
    pub fn new(rules_dir: Option<PathBuf>) -> Self {
        Self { rules_dir }
    }

    pub fn load(&self, level: CoverageLevel) -> Result<CoverageRule> {
        let (figment, source) = match self.override_path(level) {
            Some(path) => {
                debug!("Loading coverage rule from {}", path.display());
                let source = path.display().to_string();
                (Figment::from(Toml::file(path)), source)
            }
            None => (
                Figment::from(Toml::string(embedded_rule(level))),
                format!("built-in coverage_{}", level),
            ),
        };

        let rule: CoverageRule = figment.extract().map_err(|e| {
            AppError::Internal(format!("Invalid coverage rule {}: {}", source, e))
        })?;

        if rule.level != level {
            return Err(AppError::Internal(format!(
                "Coverage rule {} declares level {}, expected {}",
                source, rule.level, level
            )));
        }
        if rule.constraints.max_steps_per_case == 0 {
            return Err(AppError::Internal(format!(
                "Coverage rule {} must allow at least one step per case",
                source
            )));
        }
        Ok(rule)
    }

    fn override_path(&self, level: CoverageLevel) -> Option<PathBuf> {
        let dir = self.rules_dir.as_ref()?;
        let path = dir.join(format!("coverage_{}.toml", level));
        path.is_file().then_some(path)
    }
}

fn embedded_rule(level: CoverageLevel) -> &'static str {
    match level {
        CoverageLevel::Smoke => SMOKE_RULE,
        CoverageLevel::Regression => REGRESSION_RULE,
        CoverageLevel::Full => FULL_RULE,
    }
}
