pub mod loader;

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

const BENIGN_LABEL: &str = "benign";

/// Ground-truth category of a target URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Benign,
    Malicious,
}

impl Category {
    /// Anything that is not (case-insensitively) `benign` counts as malicious.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case(BENIGN_LABEL) {
            Category::Benign
        } else {
            Category::Malicious
        }
    }
}

/// Whether traffic to a target should pass the filter (`Good`) or be stopped (`Bad`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedClass {
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    pub expected_category: Category,
    /// The label as it appeared in the source, lowercased. Only used for display.
    pub label: String,
}

impl Target {
    pub fn new(url: impl Into<String>, expected_category: Category) -> Self {
        let label = match expected_category {
            Category::Benign => BENIGN_LABEL.to_string(),
            Category::Malicious => "malicious".to_string(),
        };
        Self {
            url: url.into(),
            expected_category,
            label,
        }
    }

    pub fn from_labeled(url: impl Into<String>, label: &str) -> Self {
        let label = label.trim().to_lowercase();
        Self {
            url: url.into(),
            expected_category: Category::from_label(&label),
            label,
        }
    }

    pub fn expected_class(&self) -> ExpectedClass {
        match self.expected_category {
            Category::Benign => ExpectedClass::Good,
            Category::Malicious => ExpectedClass::Bad,
        }
    }
}

/// The probing universe for a run. Read-only and cheap to share between tasks.
#[derive(Debug, Clone)]
pub struct TargetSet {
    targets: Arc<[Target]>,
}

impl TargetSet {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets: targets.into(),
        }
    }

    pub(crate) fn shared(&self) -> Arc<[Target]> {
        Arc::clone(&self.targets)
    }
}

impl Deref for TargetSet {
    type Target = [Target];

    fn deref(&self) -> &Self::Target {
        &self.targets
    }
}

impl From<Vec<Target>> for TargetSet {
    fn from(targets: Vec<Target>) -> Self {
        Self::new(targets)
    }
}
