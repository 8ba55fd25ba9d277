use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::error::ClassifierError;

/// Fixed bijection between category names and class indices.
///
/// Indices always form the dense range `[0, N)`, so the inverse mapping is stored
/// as a plain vector indexed by class.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Vec<String>,
    indices: HashMap<String, usize>,
}

impl LabelMap {
    /// Builds a label map from `name -> index` pairs, rejecting empty maps, empty names,
    /// duplicate names and indices that do not form a dense range.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let pairs: Vec<(String, usize)> = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        if pairs.is_empty() {
            return Err(ClassifierError::ValidationError("Label map is empty".into()));
        }

        let n = pairs.len();
        let mut slots: Vec<Option<String>> = vec![None; n];
        let mut indices = HashMap::with_capacity(n);

        for (name, index) in pairs {
            if name.is_empty() {
                return Err(ClassifierError::ValidationError("Category name cannot be empty".into()));
            }
            if index >= n {
                return Err(ClassifierError::ValidationError(format!(
                    "Index {} for '{}' is outside the range [0, {})",
                    index, name, n
                )));
            }
            if slots[index].is_some() {
                return Err(ClassifierError::ValidationError(format!(
                    "Index {} is assigned to more than one category",
                    index
                )));
            }
            if indices.insert(name.clone(), index).is_some() {
                return Err(ClassifierError::ValidationError(format!(
                    "Category '{}' appears more than once",
                    name
                )));
            }
            slots[index] = Some(name);
        }

        // n distinct in-range indices over n slots leaves no gaps
        let labels = slots.into_iter().flatten().collect();
        Ok(Self { labels, indices })
    }

    /// Parses a JSON object of the form `{"Groceries": 0, "Travel": 1}`.
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let raw: HashMap<String, usize> = serde_json::from_str(json)
            .map_err(|e| ClassifierError::ArtifactError(format!("Invalid label map: {}", e)))?;
        Self::from_pairs(raw)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ClassifierError::ArtifactError(format!("Failed to read label map {:?}: {}", path, e))
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Category name for a class index.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn index(&self, label: &str) -> Option<usize> {
        self.indices.get(label).copied()
    }

    /// Category names ordered by class index.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
