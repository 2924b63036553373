use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Shares one allocation per distinct string
///
/// Operation ids are built per script and pass; interning them keeps repeated
/// compiles of the same script from allocating new ids each time.
#[derive(Debug, Default)]
pub struct StringInterner {
    strings: Mutex<HashSet<Arc<str>>>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, value: &str) -> Arc<str> {
        let mut strings = self
            .strings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = strings.get(value) {
            return existing.clone();
        }
        let interned: Arc<str> = Arc::from(value);
        strings.insert(interned.clone());
        interned
    }

    pub fn len(&self) -> usize {
        self.strings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
