//! Questionnaire framework taxonomies
//!
//! Frameworks are static, externally supplied trees of
//! `domain -> aspect -> questions`. They are decoded from the
//! `{ "tree": { domain: { aspect: [question, ..] } } }` format with declaration
//! order preserved, then flattened into an ordered aspect list.

use crate::error::ModelError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One questionnaire item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub code: String,
    pub text: String,
    /// Ordered answer scale; the first option scores 1
    pub answer_options: Vec<String>,
    /// Counts toward maturity scoring
    pub is_answerable: bool,
    /// Belongs to the operating-model section
    pub is_soctom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

/// Group of questions within a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspect {
    pub domain: String,
    pub name: String,
    pub questions: Vec<Question>,
}

impl Aspect {
    /// Key in `domain::aspect` form
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}::{}", self.domain, self.name)
    }
}

/// Static questionnaire taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    pub id: String,
    pub name: String,
    pub aspects: Vec<Aspect>,
}

#[derive(Deserialize)]
struct RawFramework {
    #[serde(default)]
    tree: IndexMap<String, IndexMap<String, Vec<RawQuestion>>>,
}

#[derive(Deserialize)]
struct RawQuestion {
    code: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    item_type: Option<String>,
    #[serde(default)]
    answer_options: Vec<String>,
    #[serde(default)]
    guidance: Option<String>,
    #[serde(default)]
    is_answerable: Option<bool>,
    #[serde(default)]
    is_soctom: Option<bool>,
}

impl RawQuestion {
    fn into_question(self) -> Question {
        let is_answerable = self
            .is_answerable
            .unwrap_or_else(|| !self.answer_options.is_empty());
        let is_soctom = self
            .is_soctom
            .unwrap_or_else(|| self.item_type.as_deref() == Some("soctom"));
        Question {
            code: self.code,
            text: self.text,
            answer_options: self.answer_options,
            is_answerable,
            is_soctom,
            guidance: self.guidance,
        }
    }
}

impl Framework {
    /// Decode a framework from its tree JSON
    ///
    /// # Errors
    /// `ModelError::InvalidFramework` when the document does not match the tree format
    pub fn from_tree_json(
        id: impl Into<String>,
        name: impl Into<String>,
        json: &str,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        let raw: RawFramework = serde_json::from_str(json)
            .map_err(|source| ModelError::InvalidFramework { id: id.clone(), source })?;

        let aspects = raw
            .tree
            .into_iter()
            .flat_map(|(domain, aspects)| {
                aspects.into_iter().map(move |(name, questions)| Aspect {
                    domain: domain.clone(),
                    name,
                    questions: questions.into_iter().map(RawQuestion::into_question).collect(),
                })
            })
            .collect();

        Ok(Self {
            id,
            name: name.into(),
            aspects,
        })
    }

    /// Domain names in declaration order
    #[must_use]
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = Vec::new();
        for aspect in &self.aspects {
            if !domains.contains(&aspect.domain.as_str()) {
                domains.push(&aspect.domain);
            }
        }
        domains
    }

    /// Key of the first aspect, selected when navigation resets
    #[must_use]
    pub fn first_aspect_key(&self) -> Option<String> {
        self.aspects.first().map(Aspect::key)
    }

    /// Look up an aspect by key
    #[must_use]
    pub fn aspect(&self, key: &str) -> Option<&Aspect> {
        self.aspects.iter().find(|a| a.key() == key)
    }

    /// All questions in declaration order
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.aspects.iter().flat_map(|a| a.questions.iter())
    }
}

/// Frameworks available to the store, keyed by id
#[derive(Debug, Clone, Default)]
pub struct FrameworkCatalog {
    frameworks: IndexMap<String, Framework>,
}

impl FrameworkCatalog {
    /// Empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a framework, replacing any with the same id
    #[must_use]
    pub fn with(mut self, framework: Framework) -> Self {
        self.insert(framework);
        self
    }

    /// Register a framework, replacing any with the same id
    pub fn insert(&mut self, framework: Framework) {
        tracing::debug!(
            framework = %framework.id,
            aspects = framework.aspects.len(),
            "registered framework"
        );
        self.frameworks.insert(framework.id.clone(), framework);
    }

    /// Look up a framework
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Framework> {
        self.frameworks.get(id)
    }

    /// Whether the id is known
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.frameworks.contains_key(id)
    }

    /// Registered ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.frameworks.keys().map(String::as_str)
    }
}
