//! Signal handling around a foreground child script.
//!
//! While a script runs, terminal-generated interrupts reach both `skillx`
//! and the child. `skillx` catches them with a no-op handler so it outlives
//! the child, then re-raises whatever signal ended the child on itself.

use anyhow::Result;

#[cfg(unix)]
const FORWARDED: [libc::c_int; 2] = [libc::SIGINT, libc::SIGQUIT];

#[cfg(unix)]
extern "C" fn ignore_signal(_: libc::c_int) {}

#[cfg(unix)]
#[allow(unsafe_code)]
fn set_disposition(signal: libc::c_int, handler: libc::sighandler_t) -> Result<()> {
    use std::ptr;
    // SAFETY: This replaces the process-wide disposition of one signal.
    // - The sigaction struct is zero-initialised and its mask emptied with
    //   sigemptyset before use.
    // - The installed handler is either SIG_DFL or `ignore_signal`, which
    //   does nothing and is therefore async-signal-safe.
    // - Caught signals revert to SIG_DFL across exec, so children still see
    //   the default behaviour.
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_flags = libc::SA_RESTART;
        sa.sa_sigaction = handler;
        libc::sigemptyset(&mut sa.sa_mask);
        if libc::sigaction(signal, &sa, ptr::null_mut()) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
    }
    Ok(())
}

/// Keeps `skillx` alive through terminal interrupts aimed at the child.
#[cfg(unix)]
pub fn shield_while_child_runs() -> Result<()> {
    let handler = ignore_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in FORWARDED {
        set_disposition(signal, handler)?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn shield_while_child_runs() -> Result<()> {
    Ok(())
}

/// Terminates this process with `signal`, restoring its default action first.
///
/// Returns only when the signal did not end the process.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn reraise(signal: i32) -> Result<()> {
    set_disposition(signal, libc::SIG_DFL)?;
    // SAFETY: kill(2) on our own pid has no memory-safety preconditions; the
    // return code is checked and errors are propagated.
    let rc = unsafe { libc::kill(libc::getpid(), signal) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn reraise(_signal: i32) -> Result<()> {
    Ok(())
}
