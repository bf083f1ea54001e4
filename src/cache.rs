use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::schema::{FormRequest, PropertyDescriptor};

/// Process-wide memoization of per-type property descriptors.
///
/// Entries are published once and never evicted or mutated, so the map
/// only grows with the number of distinct request types encoded over the
/// cache's lifetime, a small and compile-time-known set in practice.
#[derive(Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        DescriptorCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the shared descriptors for `T`, computing and publishing
    /// them on first use.
    ///
    /// Concurrent first uses race; the first write wins, losing
    /// computations are discarded and every caller converges on the
    /// published instance.
    pub fn descriptors_for<T: FormRequest>(&self) -> Arc<Vec<PropertyDescriptor<T>>> {
        let key = TypeId::of::<T>();

        if let Some(entry) = self.entries.read().expect("descriptor cache poisoned").get(&key) {
            return Arc::clone(entry)
                .downcast()
                .expect("cache entry matches its type key");
        }

        // Built outside the lock so a lost race only costs the build.
        let built: Arc<dyn Any + Send + Sync> = Arc::new(T::properties());
        debug!("caching descriptors for {}", std::any::type_name::<T>());

        let mut entries = self.entries.write().expect("descriptor cache poisoned");
        let entry = entries.entry(key).or_insert(built);
        Arc::clone(entry)
            .downcast()
            .expect("cache entry matches its type key")
    }

    /// Number of request types described so far.
    pub fn len(&self) -> usize {
        self.entries.read().expect("descriptor cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
