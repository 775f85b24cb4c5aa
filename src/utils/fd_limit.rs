//! Open-file budget for the transform queue (Unix soft `RLIMIT_NOFILE`).

/// File descriptors one transform operation may hold at once (input, output, temp file, spare).
pub const FDS_PER_WORKER: usize = 4;

/// Share of the limit kept free for the rest of the process.
const HEADROOM_PERCENT: u64 = 20;

/// Soft limit on open file descriptors. `None` when unlimited or unknown.
#[cfg(unix)]
pub fn max_open_fds() -> Option<u64> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit only writes into `rlim`.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
    if rc != 0 || rlim.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    u64::try_from(rlim.rlim_cur).ok()
}

#[cfg(not(unix))]
pub fn max_open_fds() -> Option<u64> {
    None
}

/// Workers that fit in `fd_limit` once headroom is taken off. Never zero.
pub fn workers_for_fd_limit(fd_limit: u64) -> usize {
    let usable = fd_limit - fd_limit * HEADROOM_PERCENT / 100;
    let usable = usize::try_from(usable).unwrap_or(usize::MAX);
    (usable / FDS_PER_WORKER).max(1)
}

/// Worker cap from the current process limit, if there is one.
pub fn max_workers_by_fd_limit() -> Option<usize> {
    max_open_fds().map(workers_for_fd_limit)
}
