//! Request-scoped context.
//!
//! A [`Context`] is an immutable chain of values. Deriving a context with
//! [`Context::with_value`] never changes the original; lookups walk from the
//! newest entry to the oldest. Entries are keyed by a marker type rather than
//! a string, so a value is only reachable by code that can name its key type.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

struct Entry {
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Entry>>,
}

#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Entry>>,
}

impl Context {
    /// Empty root context
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a child context carrying `value` under key type `K`.
    pub fn with_value<K, V>(&self, value: V) -> Self
    where
        K: 'static,
        V: Any + Send + Sync,
    {
        Self {
            head: Some(Arc::new(Entry {
                key: TypeId::of::<K>(),
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Nearest value stored under `K`, if it has type `V`.
    pub fn value<K, V>(&self) -> Option<&V>
    where
        K: 'static,
        V: Any,
    {
        let key = TypeId::of::<K>();
        let mut current = self.head.as_deref();
        while let Some(entry) = current {
            if entry.key == key {
                return entry.value.downcast_ref::<V>();
            }
            current = entry.parent.as_deref();
        }
        None
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.head.as_deref();
        while let Some(entry) = current {
            depth += 1;
            current = entry.parent.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("values", &self.depth()).finish()
    }
}
