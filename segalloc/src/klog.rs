//! Minimal pluggable logging, trimmed from the style of a kernel `klog`
//! subsystem down to what a library needs: a single backend function
//! pointer, five levels, and `klog_*!` macros. With no backend registered,
//! log lines are silently dropped — callers that want output call
//! [`register_backend`] once, early.

use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static BACKEND: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

pub type Backend = fn(Level, fmt::Arguments<'_>);

/// Registers the function that receives every enabled log line. Replaces
/// any previously-registered backend.
pub fn register_backend(backend: Backend) {
    BACKEND.store(backend as *mut (), Ordering::Release);
}

/// Sets the minimum level that reaches the backend.
pub fn set_level(level: Level) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

fn is_enabled(level: Level) -> bool {
    (level as u8) <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn log_args(level: Level, args: fmt::Arguments<'_>) {
    if !is_enabled(level) {
        return;
    }
    let ptr = BACKEND.load(Ordering::Acquire);
    if ptr.is_null() {
        return;
    }
    // SAFETY: only `register_backend` ever stores into `BACKEND`, and it
    // only ever stores a valid `Backend` fn pointer.
    let backend: Backend = unsafe { core::mem::transmute(ptr) };
    backend(level, args);
}

macro_rules! klog_at {
    ($level:expr, $($arg:tt)*) => {
        $crate::klog::log_args($level, ::core::format_args!($($arg)*))
    };
}

macro_rules! klog_error {
    ($($arg:tt)*) => { $crate::klog::klog_at!($crate::klog::Level::Error, $($arg)*) };
}

macro_rules! klog_warn {
    ($($arg:tt)*) => { $crate::klog::klog_at!($crate::klog::Level::Warn, $($arg)*) };
}

macro_rules! klog_debug {
    ($($arg:tt)*) => { $crate::klog::klog_at!($crate::klog::Level::Debug, $($arg)*) };
}

macro_rules! klog_trace {
    ($($arg:tt)*) => { $crate::klog::klog_at!($crate::klog::Level::Trace, $($arg)*) };
}

pub(crate) use klog_at;
pub(crate) use klog_debug;
pub(crate) use klog_error;
#[allow(unused_imports)]
pub(crate) use klog_trace;
#[allow(unused_imports)]
pub(crate) use klog_warn;
