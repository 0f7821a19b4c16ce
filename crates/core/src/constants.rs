// Connector constants (No magic values)
use std::time::Duration;

/// Timeout of the single reachability GET (1000ms)
pub const REACHABILITY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Scheme prepended to bare hosts before probing
pub const DEFAULT_SCHEME: &str = "http://";

/// Divisor for memory/disk probes.
/// Decimal-scaled on purpose: callers compare against these exact units.
pub const CAPACITY_UNIT_BYTES: u64 = 1_024_000_000;

/// Ctrl-C, written to a managed process's stdin on teardown
pub const INTERRUPT_BYTE: u8 = 0x03;

/// Identity of the local target
pub const LOCAL_HOSTNAME: &str = "localhost";

/// Working directory of a freshly created connector
pub const DEFAULT_CWD: &str = ".";

/// Read buffer size for managed process output streams
pub const OUTPUT_CHUNK_SIZE: usize = 8192;

/// Buffered error chunks kept for a detached spawn before backpressure
pub const SPAWN_ERROR_CHANNEL_CAPACITY: usize = 64;
