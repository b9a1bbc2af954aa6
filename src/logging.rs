//! Structured `event=<name> predicate=<kind> key=value...` log lines emitted
//! while predicates are compiled, bound and evaluated.

/// Single logging target for the crate.
pub(crate) const LOG_TARGET: &str = "vecpred";

/// Predicate family a log line is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LogContext {
    predicate: &'static str,
}

impl LogContext {
    pub(crate) const fn new(predicate: &'static str) -> Self {
        Self { predicate }
    }

    pub(crate) fn predicate(&self) -> &'static str {
        self.predicate
    }
}

/// Context shared by every LIKE predicate event.
pub(crate) const LIKE_CTX: LogContext = LogContext::new("like");

/// Whether `level` reaches the installed logger for [`LOG_TARGET`].
#[inline]
pub(crate) fn enabled(level: log::Level) -> bool {
    log::log_enabled!(target: LOG_TARGET, level)
}

/// Emits one event line; arguments are only formatted when the level is on.
macro_rules! vecpred_log {
    ($level:expr, ctx: $ctx:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        let level: log::Level = $level;
        if crate::logging::enabled(level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                level,
                "event={} predicate={} {}",
                $event,
                $ctx.predicate(),
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use vecpred_log;
