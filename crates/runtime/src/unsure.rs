//! Shallow "the learner didn't understand this" heuristic.

/// Flags a message when it contains a question mark or any configured marker
/// substring.  Matching is plain substring search, not classification.
#[derive(Debug, Clone)]
pub struct UnsureDetector {
    markers: Vec<String>,
}

impl UnsureDetector {
    pub fn new(markers: impl IntoIterator<Item = String>) -> Self {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn is_unsure(&self, message: &str) -> bool {
        message.contains(['?', '？'])
            || self.markers.iter().any(|marker| message.contains(marker.as_str()))
    }
}
