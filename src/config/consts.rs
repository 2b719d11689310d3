/// Default upper bound on idle records kept by a context's object pool
pub const DEFAULT_POOL_CAPACITY: usize = 10_000;
/// Adapters log their emitted count every this many records
pub const EMIT_PROGRESS_INTERVAL: u64 = 5_000;
/// Process name used when none is configured
pub const DEFAULT_PROCESS_NAME: &str = "etl-process";
