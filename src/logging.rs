use std::io::Write;

/// Initialize logging for an orderflow process.
///
/// Respects `RUST_LOG` and defaults to `info`. Safe to call more than once;
/// the second initialization fails quietly, which is why callers use
/// `orderflow::logging::init().ok()`.
pub fn init() -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
}
