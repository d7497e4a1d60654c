//! Resource paths
//!
//! Maps a resource identity onto the REST path the configuration service
//! serves it from. User supplied segments are always percent-escaped.

/// Kind of configuration stored per scope alone.
///
/// Rules are keyed by scope and subject and have their own [`rule_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Adapter,
    Descriptor,
}

impl ResourceKind {
    /// Collection name, as used in the REST path
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Adapter => "adapters",
            Self::Descriptor => "descriptors",
        }
    }
}

/// Percent-escape a single path segment
pub fn escape_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Path of the rules for `scope` and `subject`
pub fn rule_path(scope: &str, subject: &str) -> String {
    format!(
        "core/rules/v1/{}/{}",
        escape_segment(scope),
        escape_segment(subject)
    )
}

/// Path of the adapter or descriptor configuration for `scope`
///
/// The empty segment after `v1` is part of the route the configuration
/// service registers and must be kept.
pub fn resource_path(scope: &str, kind: ResourceKind) -> String {
    format!("core/{}/v1//{}", kind.collection(), escape_segment(scope))
}
