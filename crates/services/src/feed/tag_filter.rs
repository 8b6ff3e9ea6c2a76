use std::collections::BTreeSet;

/// The fixed category set, and the listing filter derived from it.
#[derive(Debug, Clone)]
pub struct TagFilter {
    valid: BTreeSet<String>,
}

impl TagFilter {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            valid: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_valid(&self, tag: &str) -> bool {
        self.valid.contains(tag)
    }

    /// Returns the tag to filter on, or `None` for "all tags".
    ///
    /// A tag outside the set is treated as if no filter had been requested
    /// rather than as an error.
    pub fn apply(&self, tag: Option<&str>) -> Option<String> {
        tag.filter(|t| self.is_valid(t)).map(str::to_owned)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.valid.iter().map(String::as_str)
    }
}
