// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Concurrency used when the platform cannot report its parallelism.
pub const FALLBACK_CONCURRENCY: usize = 4;
/// Upper bound on how long one run waits for its declared outputs.
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 30_000;
/// How long `close()` waits for in-flight work before aborting it.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 10_000;
