//! Analysis layer: configuration, outlier detection, reconciliation, and
//! homogeneity testing.
//!
//! Architecture:
//! ```text
//!   DataTable + AnalysisConfig
//!        │
//!        ▼
//!   ┌───────────┐   Z-score over the whole column,
//!   │  detect    │   IQR + isolation forest per level
//!   └───────────┘
//!        │
//!        ▼
//!   ┌───────────┐   one record per flagged row,
//!   │ reconcile  │   union of detectors, cleaned view
//!   └───────────┘
//!        │
//!        ▼
//!   ┌─────────────┐  ANOVA / Levene / Bartlett on the
//!   │ homogeneity  │  grouped samples (full or cleaned)
//!   └─────────────┘
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod homogeneity;
pub mod reconcile;
