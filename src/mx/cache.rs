use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

/// Size-bounded map with FIFO eviction, safe to share between workers.
///
/// The lock is only held for map operations, never across a lookup, so two
/// workers missing on the same key may both query; the later insert wins.
#[derive(Debug)]
pub(crate) struct BoundedCache<V> {
    capacity: usize,
    inner: Mutex<Inner<V>>,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V: Clone> BoundedCache<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().entries.get(key).cloned()
    }

    pub(crate) fn insert(&self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), value).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let cache = BoundedCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn overwrite_keeps_position() {
        let cache = BoundedCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("a".to_string(), 10);
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = BoundedCache::new(0);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get("a"), None);
    }
}
