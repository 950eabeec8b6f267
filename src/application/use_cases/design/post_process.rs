//! Turns a parsed model reply into a persist-ready document: shape check,
//! test-type ordering, fresh row ids.

use crate::domain::design_ir::{DesignIr, GeneratedIr};
use crate::domain::error::Result;
use serde_json::Value;
use std::cmp::Ordering;
use uuid::Uuid;

pub const NORMAL_TAG: &str = "normal";
pub const ABNORMAL_TAG: &str = "abnormal";

/// Validates, orders and re-identifies rows. Nothing is reordered when the
/// shape check fails.
pub fn finalize_generated_ir(ir_json: Value) -> Result<DesignIr> {
    let generated = GeneratedIr::from_value(ir_json)?;

    let mut rows = generated.rows;
    rows.sort_by_cached_key(|row| (test_type_rank(&row.tag), CaseSortKey::new(&row.case)));

    let rows = rows
        .into_iter()
        .map(|row| row.into_row(new_row_id()))
        .collect();

    Ok(DesignIr {
        suite: generated.suite,
        rows,
    })
}

/// 0 for normal, 2 for abnormal, 1 for everything else including untagged
/// and semi-normal rows. `normal` wins when both are present.
pub fn test_type_rank(tag: &str) -> u8 {
    let mut rank = 1;
    for segment in tag.split('|').map(str::trim) {
        if segment == NORMAL_TAG {
            return 0;
        }
        if segment == ABNORMAL_TAG {
            rank = 2;
        }
    }
    rank
}

pub fn new_row_id() -> String {
    format!("row_{}", Uuid::new_v4().simple())
}

/// Locale-aware comparison of case names: case-insensitive, full-width ASCII
/// equal to half-width, katakana equal to hiragana. Ties fall back to the
/// raw string so the order is total.
pub fn compare_case_names(a: &str, b: &str) -> Ordering {
    CaseSortKey::new(a).cmp(&CaseSortKey::new(b))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CaseSortKey {
    folded: String,
    raw: String,
}

impl CaseSortKey {
    fn new(value: &str) -> Self {
        let folded = value
            .chars()
            .map(fold_width_and_kana)
            .flat_map(char::to_lowercase)
            .collect();
        Self {
            folded,
            raw: value.to_string(),
        }
    }
}

fn fold_width_and_kana(c: char) -> char {
    let code = c as u32;
    let folded = match code {
        // Full-width ASCII variants
        0xFF01..=0xFF5E => code - 0xFEE0,
        // Ideographic space
        0x3000 => 0x20,
        // Katakana to hiragana
        0x30A1..=0x30F6 => code - 0x60,
        _ => code,
    };
    char::from_u32(folded).unwrap_or(c)
}
