//! Interrupt delivery to a dedicated watcher thread.
//!
//! Interrupt signals are blocked on the serving thread and picked up
//! synchronously with `sigwait(3)` on the watcher, so cleanup runs as
//! ordinary Rust code rather than inside an async signal handler.

use crate::error::{Error, Result};
use std::os::unix::thread::JoinHandleExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Signals treated as a request to shut down.
pub const INTERRUPT_SIGNALS: [libc::c_int; 2] = [libc::SIGINT, libc::SIGTERM];

/// Owns the blocked interrupt set.
///
/// Dropping it without spawning restores the previous signal mask.
pub struct InterruptWatcher {
    set: libc::sigset_t,
    previous: libc::sigset_t,
}

impl InterruptWatcher {
    /// Block interrupt signals on the calling thread.
    ///
    /// Threads spawned afterwards inherit the mask, so call this before
    /// starting any other thread that should not see the signals.
    pub fn install() -> Result<Self> {
        let set = interrupt_set()?;
        let mut previous: libc::sigset_t = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &set, &mut previous) };
        if rc != 0 {
            return Err(Error::Signal(format!(
                "pthread_sigmask: {}",
                std::io::Error::from_raw_os_error(rc)
            )));
        }
        Ok(Self { set, previous })
    }

    /// Block until one of the interrupt signals arrives.
    pub fn wait(&self) -> Result<libc::c_int> {
        wait_for(&self.set)
    }

    /// Run `on_interrupt` on a new thread once an interrupt arrives.
    ///
    /// The mask stays in place until the returned handle is stopped.
    pub fn spawn<F>(self, on_interrupt: F) -> Result<WatcherHandle>
    where
        F: FnOnce(libc::c_int) + Send + 'static,
    {
        let (set, previous) = (self.set, self.previous);
        // The handle takes over restoring the mask.
        std::mem::forget(self);

        let done = Arc::new(AtomicBool::new(false));
        let thread_done = Arc::clone(&done);
        let spawned = thread::Builder::new()
            .name("baget-signal".to_string())
            .spawn(move || match wait_for(&set) {
                Ok(_) if thread_done.load(Ordering::SeqCst) => {}
                Ok(signal) => on_interrupt(signal),
                Err(e) => tracing::error!("interrupt watcher stopped: {}", e),
            });

        match spawned {
            Ok(thread) => Ok(WatcherHandle {
                thread: Some(thread),
                done,
                previous,
            }),
            Err(e) => {
                restore_mask(&previous);
                Err(Error::Io(e))
            }
        }
    }
}

impl Drop for InterruptWatcher {
    fn drop(&mut self) {
        restore_mask(&self.previous);
    }
}

/// A running watcher thread.
///
/// Stopping (or dropping) it wakes the thread if it is still waiting,
/// joins it, and restores the signal mask that was in place before
/// [`InterruptWatcher::install`].
pub struct WatcherHandle {
    thread: Option<JoinHandle<()>>,
    done: Arc<AtomicBool>,
    previous: libc::sigset_t,
}

impl WatcherHandle {
    /// Whether the watcher already handled an interrupt.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.done.store(true, Ordering::SeqCst);
        if !thread.is_finished() {
            // Not joined yet, so the pthread id is still valid.
            let rc = unsafe { libc::pthread_kill(thread.as_pthread_t(), libc::SIGTERM) };
            if rc != 0 {
                tracing::warn!("failed to wake interrupt watcher: {}", std::io::Error::from_raw_os_error(rc));
            }
        }
        if thread.join().is_err() {
            tracing::warn!("interrupt watcher panicked");
        }
        restore_mask(&self.previous);
    }
}

fn wait_for(set: &libc::sigset_t) -> Result<libc::c_int> {
    let mut signal: libc::c_int = 0;
    let rc = unsafe { libc::sigwait(set, &mut signal) };
    if rc != 0 {
        return Err(Error::Signal(format!(
            "sigwait: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }
    Ok(signal)
}

fn restore_mask(previous: &libc::sigset_t) {
    let rc = unsafe { libc::pthread_sigmask(libc::SIG_SETMASK, previous, std::ptr::null_mut()) };
    if rc != 0 {
        tracing::warn!("failed to restore signal mask: {}", std::io::Error::from_raw_os_error(rc));
    }
}

fn interrupt_set() -> Result<libc::sigset_t> {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        if libc::sigemptyset(&mut set) != 0 {
            return Err(Error::Signal("sigemptyset failed".to_string()));
        }
        for signal in INTERRUPT_SIGNALS {
            if libc::sigaddset(&mut set, signal) != 0 {
                return Err(Error::Signal(format!("sigaddset({}) failed", signal)));
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_set_membership() {
        let set = interrupt_set().unwrap();
        unsafe {
            assert_eq!(libc::sigismember(&set, libc::SIGINT), 1);
            assert_eq!(libc::sigismember(&set, libc::SIGTERM), 1);
            assert_eq!(libc::sigismember(&set, libc::SIGHUP), 0);
        }
    }

    fn interrupts_blocked() -> bool {
        unsafe {
            let mut current: libc::sigset_t = std::mem::zeroed();
            libc::pthread_sigmask(libc::SIG_BLOCK, std::ptr::null(), &mut current);
            libc::sigismember(&current, libc::SIGINT) == 1
        }
    }

    #[test]
    fn test_stop_wakes_watcher_and_restores_mask() {
        // Own thread so the blocked mask does not leak into the harness.
        thread::spawn(|| {
            assert!(!interrupts_blocked());
            let watcher = InterruptWatcher::install().unwrap();
            assert!(interrupts_blocked());

            let fired = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&fired);
            let handle = watcher
                .spawn(move |_| flag.store(true, Ordering::SeqCst))
                .unwrap();
            assert!(!handle.is_finished());

            handle.stop();
            assert!(!fired.load(Ordering::SeqCst));
            assert!(!interrupts_blocked());

            // a second install works from a clean slate
            let again = InterruptWatcher::install().unwrap();
            assert!(interrupts_blocked());
            drop(again);
            assert!(!interrupts_blocked());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_unspawned_watcher_restores_mask() {
        thread::spawn(|| {
            let watcher = InterruptWatcher::install().unwrap();
            assert!(interrupts_blocked());
            drop(watcher);
            assert!(!interrupts_blocked());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_wait_receives_thread_directed_signal() {
        // Own thread so the blocked mask does not leak into the harness.
        let got = thread::spawn(|| {
            let watcher = InterruptWatcher::install().unwrap();
            let rc = unsafe { libc::pthread_kill(libc::pthread_self(), libc::SIGTERM) };
            assert_eq!(rc, 0);
            watcher.wait().unwrap()
        })
        .join()
        .unwrap();
        assert_eq!(got, libc::SIGTERM);
    }
}
