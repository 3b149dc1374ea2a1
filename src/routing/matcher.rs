//! Dotted topic prefix matching.
//!
//! # Responsibilities
//! - Enumerate the candidate settings paths for a topic
//! - Match prefixes on whole dotted components only
//!
//! # Design Decisions
//! - Candidates are yielded longest first, so the first hit is the best match
//! - No regex or wildcard syntax; `gcn.classic.voe` never matches
//!   `gcn.classic.voevent.X`

/// Iterator over a topic and its dotted ancestors, longest first.
///
/// `gcn.classic.voevent.FERMI_GBM_ALERT` yields itself, then
/// `gcn.classic.voevent`, `gcn.classic` and `gcn`.
#[derive(Debug, Clone)]
pub struct DottedAncestors<'a> {
    next: Option<&'a str>,
}

impl<'a> Iterator for DottedAncestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current
            .rsplit_once('.')
            .map(|(parent, _)| parent)
            .filter(|parent| !parent.is_empty());
        Some(current)
    }
}

/// Candidate settings paths for `topic`, most specific first.
pub fn dotted_ancestors(topic: &str) -> DottedAncestors<'_> {
    DottedAncestors {
        next: Some(topic).filter(|t| !t.is_empty()),
    }
}

/// Whether `prefix` equals `topic` or is one of its dotted ancestors.
#[cfg(test)]
pub(crate) fn is_dotted_prefix(prefix: &str, topic: &str) -> bool {
    match topic.strip_prefix(prefix) {
        Some(rest) => !prefix.is_empty() && (rest.is_empty() || rest.starts_with('.')),
        None => false,
    }
}
