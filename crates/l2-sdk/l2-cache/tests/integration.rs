use std::sync::Arc;

use l2_cache::{CacheConfig, LruTxOutCache};
use l2_sdk::testing::{sample_tx_in, sample_tx_out, sample_utxo};
use l2_sdk::{InputResolver, ResolveHints, TxOutCache};

#[tokio::test]
async fn resolver_fills_lru_cache_from_hints() {
    let cache = Arc::new(LruTxOutCache::new(&CacheConfig::default()).unwrap());
    let resolver = InputResolver::new(cache.clone());
    let input = sample_tx_in(4, 2);
    let hints = ResolveHints {
        utxos: vec![sample_utxo(4, 2, "addrH", 42)],
        ..Default::default()
    };

    let first = resolver.resolve_input(&input, Some(&hints)).await;
    assert_eq!(first, Some(sample_tx_out("addrH", 42)));
    assert_eq!(cache.get(&input.key()), first);

    // No hints: answered from the cache alone.
    assert_eq!(resolver.resolve_input(&input, None).await, first);
}

#[tokio::test]
async fn evicted_inputs_are_unresolved_again() {
    let cache = Arc::new(LruTxOutCache::new(&CacheConfig::new(1)).unwrap());
    let resolver = InputResolver::new(cache.clone());
    let hints = ResolveHints {
        utxos: vec![sample_utxo(1, 0, "addrA", 1), sample_utxo(2, 0, "addrB", 2)],
        ..Default::default()
    };

    let a = sample_tx_in(1, 0);
    let b = sample_tx_in(2, 0);
    assert!(resolver.resolve_input(&a, Some(&hints)).await.is_some());
    assert!(resolver.resolve_input(&b, Some(&hints)).await.is_some());

    assert_eq!(resolver.resolve_input(&a, None).await, None);
    assert!(resolver.resolve_input(&b, None).await.is_some());
}

#[tokio::test]
async fn concurrent_resolutions_share_the_cache() {
    let cache = Arc::new(LruTxOutCache::new(&CacheConfig::default()).unwrap());
    let resolver = Arc::new(InputResolver::new(cache.clone()));
    let hints = Arc::new(ResolveHints {
        utxos: (0..16).map(|i| sample_utxo(i, 0, "addrC", u64::from(i))).collect(),
        ..Default::default()
    });

    let tasks: Vec<_> = (0..16u8)
        .map(|i| {
            let resolver = resolver.clone();
            let hints = hints.clone();
            tokio::spawn(async move {
                resolver
                    .resolve_input(&sample_tx_in(i, 0), Some(&hints))
                    .await
            })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().is_some());
    }
    assert_eq!(cache.len(), 16);
}
