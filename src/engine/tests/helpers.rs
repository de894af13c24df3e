use crate::engine::EngineConfig;
use crate::psa::{PersistentSortedArray, RECORD_SIZE};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times; only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config sized in keys rather than bytes, so tests can spell out exactly
/// when flushes and cascades fire.
pub fn keys_config(capacity_keys: usize, level_growth: u64) -> EngineConfig {
    init_tracing();
    EngineConfig {
        write_buffer_size: capacity_keys * RECORD_SIZE as usize,
        level_growth,
    }
}

/// Buffer large enough that nothing reaches disk without an explicit flush
/// or drop.
pub fn memtable_only_config() -> EngineConfig {
    keys_config(1024, 10)
}

/// Whether `level<n>` exists under `dir`.
pub fn level_exists(dir: &Path, level: u64) -> bool {
    dir.join(format!("level{level}")).exists()
}

/// Reads every live record of `level<n>` under `dir`.
///
/// Asserts existence first, since opening would create the file and quietly
/// break contiguity assertions.
pub fn level_keys(dir: &Path, level: u64) -> Vec<u64> {
    let path = dir.join(format!("level{level}"));
    assert!(path.exists(), "level{level} does not exist");

    let psa = PersistentSortedArray::open(path).unwrap();
    (0..psa.len().unwrap()).map(|i| psa.get(i).unwrap()).collect()
}

/// Asserts a run is strictly ascending.
pub fn assert_strictly_sorted(keys: &[u64]) {
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "run not strictly sorted: {pair:?}");
    }
}
