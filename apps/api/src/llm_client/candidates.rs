//! Ordered model candidates for the fallback loop.
//!
//! Order is preference: the first entry is tried first and the loop stops at the
//! first model that answers. Reordering is configuration, never code.

use std::fmt;

use thiserror::Error;

/// Default preference order, most capable / most available first.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-flash-latest",
    "gemini-2.0-flash",
    "gemini-pro-latest",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

/// One provider model variant, e.g. `gemini-2.0-flash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelCandidate(String);

impl ModelCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("candidate model list is empty")]
pub struct EmptyCandidateList;

/// Non-empty, ordered list of candidates. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateList(Vec<ModelCandidate>);

impl CandidateList {
    /// Builds a list from names, dropping blanks and later duplicates.
    pub fn new<I, S>(names: I) -> Result<Self, EmptyCandidateList>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut models: Vec<ModelCandidate> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || models.iter().any(|m| m.as_str() == name) {
                continue;
            }
            models.push(ModelCandidate::new(name));
        }

        if models.is_empty() {
            return Err(EmptyCandidateList);
        }
        Ok(Self(models))
    }

    /// Parses a comma-separated override such as `GEMINI_MODELS`.
    pub fn parse(raw: &str) -> Result<Self, EmptyCandidateList> {
        Self::new(raw.split(','))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelCandidate> {
        self.0.iter()
    }

    /// Never zero; the list is non-empty by construction.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for CandidateList {
    fn default() -> Self {
        Self(DEFAULT_MODELS.iter().map(|m| ModelCandidate::new(*m)).collect())
    }
}

impl fmt::Display for CandidateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(ModelCandidate::as_str).collect();
        f.write_str(&names.join(" -> "))
    }
}
