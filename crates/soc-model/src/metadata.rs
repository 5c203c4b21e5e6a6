//! Assessment metadata and its default template

use serde::{Deserialize, Serialize};

/// Title used when neither a title nor an organization name was ever entered
pub const DEFAULT_TITLE: &str = "Untitled assessment";

/// Free-form descriptive fields attached to an assessment
///
/// Every field is always present after hydration; missing values are
/// backfilled from [`Metadata::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Display title of the assessment
    pub assessment_title: String,
    /// Organization name
    pub name: String,
    /// Budget amount as entered
    pub budget_amount: String,
    /// Budget currency symbol or code
    pub budget_currency: String,
    /// Organization size bracket
    pub size: String,
    /// Industry sector
    pub sector: String,
    /// Age of the SOC
    pub soc_age: String,
    /// Improvement objectives
    pub objectives: Vec<String>,
    /// Workflow status label
    pub status: String,
    /// Report language
    pub language: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            assessment_title: DEFAULT_TITLE.to_string(),
            name: "My SOC".to_string(),
            budget_amount: String::new(),
            budget_currency: "$".to_string(),
            size: "Mid-market".to_string(),
            sector: String::new(),
            soc_age: String::new(),
            objectives: vec![
                "Reduce MTTR".to_string(),
                "Improve detection coverage".to_string(),
            ],
            status: "In progress".to_string(),
            language: "en".to_string(),
        }
    }
}

impl Metadata {
    /// Whether any field differs from the default template
    #[inline]
    #[must_use]
    pub fn diverges_from_template(&self) -> bool {
        *self != Self::default()
    }

    /// Merge a partial update
    pub fn apply(&mut self, patch: MetadataPatch) {
        let MetadataPatch {
            assessment_title,
            name,
            budget_amount,
            budget_currency,
            size,
            sector,
            soc_age,
            objectives,
            status,
            language,
        } = patch;

        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(value) = $field { self.$field = value; })*
            };
        }
        merge!(
            assessment_title,
            name,
            budget_amount,
            budget_currency,
            size,
            sector,
            soc_age,
            objectives,
            status,
            language
        );
    }
}

/// Partial metadata update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    pub assessment_title: Option<String>,
    pub name: Option<String>,
    pub budget_amount: Option<String>,
    pub budget_currency: Option<String>,
    pub size: Option<String>,
    pub sector: Option<String>,
    pub soc_age: Option<String>,
    pub objectives: Option<Vec<String>>,
    pub status: Option<String>,
    pub language: Option<String>,
}

impl MetadataPatch {
    /// Patch that only sets the language
    #[must_use]
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    /// Patch that only sets the organization name
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}
