//! SOC Scoring - maturity scores from raw answers
//!
//! Fixed two-level hierarchical average:
//!
//! 1. A question's score is the 1-based position of its answer in the option
//!    list. Unanswered or unknown answers are excluded.
//! 2. An aspect scores the mean of its answered questions (0 if none).
//! 3. A domain scores the mean of its aspects, each weighted equally regardless
//!    of question count.
//! 4. Maturity is the mean of all domains, rounded to 2 decimals.
//!
//! Question counts deliberately do not weight the aspect -> domain step.
//!
//! ```rust
//! use soc_model::Framework;
//! use std::collections::BTreeMap;
//!
//! let fw = Framework::from_tree_json("x", "X", r#"{"tree":{"D":{"A":[
//!     {"code":"q","text":"","answer_options":["a","b","c"]}]}}}"#).unwrap();
//! let answers = BTreeMap::from([("q".to_string(), "c".to_string())]);
//! assert_eq!(soc_scoring::compute_scores(&fw, &answers).maturity, 3.0);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod progress;
mod scores;

pub use progress::{domain_progress, DomainProgress};
pub use scores::{compute_scores, ordinal, round2, Scores};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
