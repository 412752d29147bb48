use core_pattern::TestCase;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternDocument {
    /// Assigned by the repository on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default, rename = "test_case")]
    pub test_cases: Vec<TestCase>,
}

impl PatternDocument {
    pub fn new(title: impl Into<String>, pattern: impl Into<String>, test_cases: Vec<TestCase>) -> Self {
        Self {
            id: None,
            title: title.into(),
            pattern: pattern.into(),
            test_cases,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, StoreError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn read_from(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        let doc = Self::from_toml_str(&content)?;
        debug!(target: "model.document", file = %path.display(), cases = doc.test_cases.len(), "document_read");
        Ok(doc)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), StoreError> {
        fs::write(path, self.to_toml_string()?)?;
        debug!(target: "model.document", file = %path.display(), cases = self.test_cases.len(), "document_written");
        Ok(())
    }
}
