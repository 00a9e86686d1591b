//! ---
//! fmon_section: "03-logging"
//! fmon_subsection: "module"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Structured logging adapters and sinks."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
/// Shared expansion for the level-specific macros. Not part of the public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __fmon_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext = &$ctx;
        tracing::event!(
            $level,
            zone = ctx.zone.unwrap_or(""),
            scenario = ctx.scenario.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            listener = ctx.listener.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with simulator context.
#[macro_export]
macro_rules! fmon_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with simulator context.
#[macro_export]
macro_rules! fmon_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning log enriched with simulator context.
#[macro_export]
macro_rules! fmon_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with simulator context.
#[macro_export]
macro_rules! fmon_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__fmon_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
