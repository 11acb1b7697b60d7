// Extra timer logging
#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        // Nothing
    };
}

// FACADE CONSTRUCTION LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_facades")]
macro_rules! facade_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_facades"))]
macro_rules! facade_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// UNIFICATION LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_unification")]
macro_rules! unify_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_unification"))]
macro_rules! unify_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// LIFETIME GRAPH LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_lifetimes")]
macro_rules! lifetime_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_lifetimes"))]
macro_rules! lifetime_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// BORROW INSERTION LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_borrow_insertion")]
macro_rules! borrow_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_borrow_insertion"))]
macro_rules! borrow_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
