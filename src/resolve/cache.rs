use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use super::{IdResolver, ResolveRequest, ResolvedMap};
use crate::error::Result;
use crate::graph::EquivalentIds;

/// LRU memoization in front of another resolver
///
/// Answers for a node are cached under `(entity_type, identifier_kind, key)`, so a node
/// seen in an earlier query round is not sent to the service again. An answer keyed
/// `kind:key` is cached under the bare node key. Keys the service did not recognize
/// are not cached.
pub struct CachingResolver<R> {
    inner: R,
    cache: Mutex<LruCache<(String, String, String), EquivalentIds>>,
}

impl<R: IdResolver> CachingResolver<R> {
    /// Wrap `inner` with a cache holding at most `capacity` nodes (minimum 1)
    pub fn new(inner: R, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<(String, String, String), EquivalentIds>> {
        // A poisoned cache only means another caller panicked mid-insert; entries stay valid.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn cache_key(request: &ResolveRequest, node_key: &str) -> (String, String, String) {
    (
        request.entity_type.clone(),
        request.identifier_kind.clone(),
        node_key.to_string(),
    )
}

#[async_trait]
impl<R: IdResolver> IdResolver for CachingResolver<R> {
    async fn convert(&self, requests: Vec<ResolveRequest>) -> Result<ResolvedMap> {
        let mut resolved = ResolvedMap::new();
        let mut misses = Vec::new();

        {
            let mut cache = self.lock();
            for request in &requests {
                let mut missing = Vec::new();
                for key in &request.node_keys {
                    match cache.get(&cache_key(request, key)) {
                        Some(ids) => {
                            resolved.insert(key.clone(), ids.clone());
                        }
                        None => missing.push(key.clone()),
                    }
                }
                if !missing.is_empty() {
                    misses.push(ResolveRequest {
                        node_keys: missing,
                        identifier_kind: request.identifier_kind.clone(),
                        entity_type: request.entity_type.clone(),
                    });
                }
            }
        }

        if misses.is_empty() {
            log::debug!("Resolver cache hit for all {} nodes", resolved.len());
            return Ok(resolved);
        }

        let fetched = self.inner.convert(misses.clone()).await?;
        // Answers may come back keyed by CURIE (`NCBIGene:1017` for node `1017`)
        let unprefixed: HashMap<&str, &EquivalentIds> = fetched
            .iter()
            .filter_map(|(key, ids)| key.split_once(':').map(|(_, rest)| (rest, ids)))
            .collect();

        let mut cache = self.lock();
        for request in &misses {
            for key in &request.node_keys {
                let answer = fetched
                    .get(key)
                    .or_else(|| unprefixed.get(key.as_str()).copied());
                if let Some(ids) = answer {
                    cache.put(cache_key(request, key), ids.clone());
                }
            }
        }
        drop(cache);

        resolved.extend(fetched);
        Ok(resolved)
    }
}
