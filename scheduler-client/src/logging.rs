use std::io::Write;

use env_logger::Env;

/// Install the process-wide logger. Lines look like
/// `[14:03:07.512] INFO meeting_scheduler: fetched meeting abc`.
///
/// Filter defaults to `info`; override with `RUST_LOG`. Safe to call more
/// than once, later calls are ignored.
pub fn init() {
    let result = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{}] {} {}: {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::debug!(
            target: "meeting_scheduler",
            "=== meeting-scheduler v{} started ({}/{}) ===",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        );
    }
}

/// Convenience macro for info logging under the crate's log target.
#[macro_export]
macro_rules! slog {
    ($($arg:tt)*) => {
        ::log::info!(target: "meeting_scheduler", $($arg)*)
    };
}
