use std::fmt;

/// A domain record that can be overlaid with pending operations.
///
/// An entity has no id until the backend has persisted it. Entities that own
/// a list of child ids (events in a collection, participants in a team)
/// expose it through `related_ids`, which is what relationship edits mutate.
pub trait Entity: Clone + fmt::Debug {
    fn id(&self) -> Option<&str>;

    /// Human-readable fragment used when synthesizing a temporary key.
    fn key_hint(&self) -> String;

    fn related_ids(&self) -> Option<&[String]> {
        None
    }

    fn related_ids_mut(&mut self) -> Option<&mut Vec<String>> {
        None
    }
}
