use crate::compiler::{CompileRequest, ScriptCompiler, ScriptRunner};
use crate::error::Result;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Wraps a compiler and reuses runners for identical compile requests
///
/// Two requests are identical when they compile the same source text, under
/// the same operation id, against scopes with the same fingerprint. Failed
/// compiles are not cached.
pub struct CachingScriptCompiler<C> {
    inner: C,
    cache: Mutex<LruCache<String, Arc<dyn ScriptRunner>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<C: ScriptCompiler> CachingScriptCompiler<C> {
    pub fn new(inner: C) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: C, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache().len(),
        }
    }

    pub fn clear(&self) {
        self.cache().clear();
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<String, Arc<dyn ScriptRunner>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cache_key(request: &CompileRequest<'_>) -> String {
        format!(
            "{}:{:x}:{}:{}:{:?}:{}",
            request.source.id(),
            md5::compute(request.source.text().as_bytes()),
            request.operation_id,
            request.scope.fingerprint(),
            request.verifier,
            request.extract_data
        )
    }
}

impl<C: ScriptCompiler> ScriptCompiler for CachingScriptCompiler<C> {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Arc<dyn ScriptRunner>> {
        let key = Self::cache_key(request);

        if let Some(runner) = self.cache().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                "Compile cache hit for {} ({})",
                request.source.display_name(),
                request.operation_id
            );
            return Ok(runner.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Compile cache miss for {} ({})",
            request.source.display_name(),
            request.operation_id
        );
        let runner = self.inner.compile(request)?;
        self.cache().put(key, runner.clone());
        Ok(runner)
    }
}
