// Engine constants (no magic values in the executors)
use std::time::Duration;

/// Bytes copied from the input source into stdin per polling iteration (16 KiB)
pub const STDIN_CHUNK_SIZE: usize = 16 * 1024;

/// Read buffer used when draining stdout/stderr (8 KiB)
pub const PIPE_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Sleep between polling iterations while the process is alive (10ms)
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output pipes are drained to EOF after the process exited (500ms)
/// Bounds the wait when a detached grandchild keeps a pipe open.
pub const POST_EXIT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Exit code base for signal termination (`128 + N`, shell convention)
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Exit code reported when the status could not be decoded
pub const UNKNOWN_EXIT_CODE: i32 = -1;
