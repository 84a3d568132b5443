//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Row repositories locate records by comparing this id against the first
/// column of each stored row.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Human-readable kind used in `NotFound` messages ("item", "transfer").
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
