//! Row repair
//!
//! Reassigns the values of a column-shifted row according to the rule named
//! by its [`ShiftSignature`]. Repair is all-or-nothing: if any field in the
//! rule's span still breaks its shape afterwards, the original row is
//! returned untouched and flagged.

use tracing::{debug, warn};

use crate::models::{Record, RecordIssue};
use crate::validation::{AnomalyDetector, ShapeTable, ShiftRule, ShiftSignature};

/// Result of attempting to repair one row
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// Every span field now satisfies its shape
    Repaired(Record),
    /// Original row returned unchanged
    Rejected { record: Record, reason: String },
}

impl RepairOutcome {
    pub fn is_repaired(&self) -> bool {
        matches!(self, RepairOutcome::Repaired(_))
    }

    pub fn into_record(self) -> Record {
        match self {
            RepairOutcome::Repaired(record) => record,
            RepairOutcome::Rejected { record, .. } => record,
        }
    }

    /// Issue to report for a rejected repair
    pub fn issue(&self, signature: &ShiftSignature) -> Option<RecordIssue> {
        match self {
            RepairOutcome::Repaired(_) => None,
            RepairOutcome::Rejected { record, reason } => Some(RecordIssue::UnrepairedAnomaly {
                line: record.line,
                handle: record.handle().to_string(),
                fields: vec![signature.start.clone(), signature.end.clone()],
                reason: reason.clone(),
            }),
        }
    }
}

/// Applies shift rules and verifies the result
#[derive(Debug, Clone)]
pub struct RowRepairer<'a> {
    shapes: &'a ShapeTable,
    rules: Vec<&'a ShiftRule>,
}

impl<'a> RowRepairer<'a> {
    pub fn new(shapes: &'a ShapeTable, rules: impl IntoIterator<Item = &'a ShiftRule>) -> Self {
        Self {
            shapes,
            rules: rules.into_iter().collect(),
        }
    }

    /// Repairer sharing a detector's shapes and rules
    pub fn for_detector(detector: &'a AnomalyDetector, rules: &'a [ShiftRule]) -> Self {
        Self::new(detector.shapes(), rules)
    }

    pub fn repair(&self, record: &Record, signature: &ShiftSignature) -> RepairOutcome {
        let Some(rule) = self.rules.iter().find(|rule| rule.name == signature.rule) else {
            return RepairOutcome::Rejected {
                record: record.clone(),
                reason: format!("unknown shift rule '{}'", signature.rule),
            };
        };

        let mut repaired = rule.apply(record);
        let broken: Vec<String> = rule
            .span_fields(record.header())
            .into_iter()
            .filter(|field| !self.shapes.check(field, repaired.get(field)))
            .collect();

        if !broken.is_empty() {
            warn!(
                line = record.line,
                handle = record.handle(),
                rule = %rule.name,
                fields = ?broken,
                "Repair rejected"
            );
            return RepairOutcome::Rejected {
                record: record.clone(),
                reason: format!("repaired values still malformed in {}", broken.join(", ")),
            };
        }

        repaired.raw = None;
        debug!(line = record.line, handle = record.handle(), rule = %rule.name, "Row repaired");
        RepairOutcome::Repaired(repaired)
    }
}
