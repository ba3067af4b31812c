// Debug line tagged with the simulated time and the calling process
#[macro_export]
macro_rules! debug_process {
    ($ctx:expr, $($arg:tt)+) => {
        log::debug!(
            "[Now: {} | P{}] {}",
            $ctx.now(),
            $ctx.pid(),
            format_args!($($arg)+)
        );
    };
}
