// Opaque native handles and type-safe entity ids

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::NonZeroU64;

/// Opaque identifier of a native-owned entity
///
/// The raw value `0` is reserved as the "absent" sentinel, so an absent
/// handle is spelled `Option<Handle>` and costs nothing extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Wrap a raw value; `0` yields `None`
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Pack a native `(index, generation)` pair
    pub(crate) fn from_parts(index: u32, generation: u32) -> Self {
        let packed = ((generation as u64) << 32) | index as u64;
        // Only the all-ones pair would wrap, and the native arena never hands it out.
        Self(NonZeroU64::new(packed.wrapping_add(1)).unwrap_or(NonZeroU64::MAX))
    }

    /// Unpack into the native `(index, generation)` pair
    pub(crate) fn parts(self) -> (u32, u32) {
        let packed = self.0.get() - 1;
        (packed as u32, (packed >> 32) as u32)
    }

    /// Get the raw u64 value
    pub fn as_u64(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (index, generation) = self.parts();
        write!(f, "{}v{}", index, generation)
    }
}

/// Type-safe id of a live proxy
///
/// The `T` parameter ensures a body id can't be passed where a fixture id
/// is expected, even though both wrap the same kind of native handle.
pub struct EntityId<T> {
    handle: Handle,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying native handle
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

// Manual impls: deriving would put bounds on `T`.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>();
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "{}({})", short, self.handle)
    }
}

/// Convenience type aliases
pub type BodyId = EntityId<super::body::Body>;
pub type FixtureId = EntityId<super::fixture::Fixture>;
pub type JointId = EntityId<super::joint::Joint>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_absent() {
        assert!(Handle::from_raw(0).is_none());
        assert_eq!(Handle::from_raw(7).map(|h| h.as_u64()), Some(7));
    }

    #[test]
    fn test_parts_roundtrip() {
        let handle = Handle::from_parts(0, 0);
        assert_eq!(handle.as_u64(), 1);
        assert_eq!(handle.parts(), (0, 0));

        let handle = Handle::from_parts(42, 3);
        assert_eq!(handle.parts(), (42, 3));
    }

    #[test]
    fn test_generation_distinguishes_slot_reuse() {
        let first = Handle::from_parts(5, 0);
        let reused = Handle::from_parts(5, 1);
        assert_ne!(first, reused, "Same slot with a newer generation must differ");
    }

    #[test]
    fn test_entity_id_equality() {
        let handle = Handle::from_parts(1, 0);
        let a: BodyId = EntityId::new(handle);
        let b: BodyId = EntityId::new(handle);
        assert_eq!(a, b);
        assert_eq!(a.handle(), handle);
        assert!(format!("{:?}", a).starts_with("Body("));
    }
}
