//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products and requisitions keep their identity while their stock or status
/// changes; movements are entities too, but never change after creation.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
