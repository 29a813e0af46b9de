//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// An entity is identified by its id, not by its attribute values; the store
/// keys on `Id` and treats the rest of the struct as replaceable.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
