// Native handle -> live proxy mapping, one registry per entity kind

use super::handle::Handle;
use log::error;
use std::collections::HashMap;

/// Maps each live native handle to its single managed proxy
///
/// The registry owns the proxy while it is live. `unregister` hands the
/// proxy back by value, so a proxy can never be reachable through a lookup
/// and sitting in a pool at the same time.
pub struct HandleRegistry<T> {
    /// Entity kind, used in diagnostics
    kind: &'static str,

    /// Live proxies keyed by native handle
    entries: HashMap<Handle, T>,
}

impl<T> HandleRegistry<T> {
    /// Create an empty registry
    pub fn new(kind: &'static str) -> Self {
        Self::with_capacity(kind, 0)
    }

    /// Create a registry with room for `capacity` proxies
    pub fn with_capacity(kind: &'static str, capacity: usize) -> Self {
        Self {
            kind,
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Register the proxy for a freshly created native entity
    ///
    /// # Panics
    /// If the handle is already registered: the native side handed out a
    /// handle that was never unregistered.
    pub fn register(&mut self, handle: Handle, proxy: T) {
        if self.entries.insert(handle, proxy).is_some() {
            error!("{} handle {} registered twice", self.kind, handle);
            panic!(
                "{} registry desync: handle {} was already registered",
                self.kind, handle
            );
        }
    }

    /// Optional lookup; absence is a normal outcome
    pub fn lookup(&self, handle: Handle) -> Option<&T> {
        self.entries.get(&handle)
    }

    /// Optional mutable lookup
    pub fn lookup_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries.get_mut(&handle)
    }

    /// Lookup for a handle the native engine just reported
    ///
    /// # Panics
    /// On a miss. A reported handle without a proxy means the managed and
    /// native sides have diverged.
    pub fn resolve(&self, handle: Handle) -> &T {
        match self.entries.get(&handle) {
            Some(proxy) => proxy,
            None => desync(self.kind, handle),
        }
    }

    /// Mutable variant of [`resolve`](Self::resolve)
    pub fn resolve_mut(&mut self, handle: Handle) -> &mut T {
        let kind = self.kind;
        match self.entries.get_mut(&handle) {
            Some(proxy) => proxy,
            None => desync(kind, handle),
        }
    }

    /// Remove the proxy, handing ownership back to the caller
    pub fn unregister(&mut self, handle: Handle) -> Option<T> {
        self.entries.remove(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Iterate over all live proxies
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Iterate over all live handles
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.keys().copied()
    }
}

#[cold]
#[track_caller]
fn desync(kind: &'static str, handle: Handle) -> ! {
    error!("{} handle {} reported by the engine has no proxy", kind, handle);
    panic!(
        "{} registry desync: no live proxy for handle {}",
        kind, handle
    );
}
