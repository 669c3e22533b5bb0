//! Installs the shell's signal handling: SIGINT is forwarded to whatever
//! process group is currently in the foreground; SIGTSTP is ignored outright
//! (this shell has no job-control built-ins to suspend a job into).

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Process-wide foreground process-group id. Zero means "no foreground
/// pipeline is running" — the handler then just notes the interrupt and
/// does not forward it anywhere. Single atomic word: no lock, so it is
/// safe to touch from the signal handler.
static FOREGROUND_PGID: AtomicI32 = AtomicI32::new(0);

/// Set by the handler, cleared by the REPL at the top of each iteration.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Install the SIGINT handler and ignore SIGTSTP. Call once at startup.
pub fn install() {
    ctrlc::set_handler(on_sigint).expect("jsh: failed to install SIGINT handler");

    #[cfg(unix)]
    unsafe {
        if libc::signal(libc::SIGTSTP, libc::SIG_IGN) == libc::SIG_ERR {
            eprintln!(
                "jsh: failed to ignore SIGTSTP: {}",
                std::io::Error::last_os_error()
            );
        }
    }
}

fn on_sigint() {
    INTERRUPTED.store(true, Ordering::SeqCst);

    let pgid = FOREGROUND_PGID.load(Ordering::SeqCst);
    if pgid != 0 {
        #[cfg(unix)]
        unsafe {
            libc::kill(-pgid, libc::SIGINT);
        }
    }
}

/// Record the pgid that should receive a forwarded SIGINT, or 0 to clear it.
pub fn set_foreground_pgid(pgid: i32) {
    FOREGROUND_PGID.store(pgid, Ordering::SeqCst);
}

pub fn clear_foreground_pgid() {
    set_foreground_pgid(0);
}

/// True if SIGINT has arrived since the last [`clear_interrupted`].
pub fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

pub fn clear_interrupted() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}
