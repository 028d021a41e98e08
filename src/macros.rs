/// Similar to `info!` macro in tracing, which it forwards to.
/// Pass in the starting time and it will log how long it took from starting time to now.
/// ```ignore
/// let time = Local::now();
/// info_time!(time, "str {}, {}", 1, 2);
/// ```
#[macro_export]
macro_rules! info_time {
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        let run_time = (::chrono::Local::now() - $time)
                .num_microseconds()
                .map(|n| n as f64 / 1_000_000.0)
                .unwrap_or(0.0);
        ::tracing::info!("{} (runtime: {} sec)", format!($strfm, $($arg),*), run_time);
    }};
}
