//! Validation functionality
//!
//! Provides the checks that find structurally broken catalog rows:
//! - Shape predicates (expected value form per column)
//! - Shift rules (declarative known column-shift patterns)
//! - Anomaly detection (matching rows against the rules inside an allow-list)

pub mod detector;
pub mod rules;
pub mod shapes;

pub use detector::{AllowList, AnomalyDetector, Detection, DetectionConfig};
pub use rules::{FieldFallback, FieldMove, ShiftDirection, ShiftRule, ShiftSignature};
pub use shapes::{FieldShape, Shape, ShapeTable, is_url};
