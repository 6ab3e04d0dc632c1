use chrono::Local;
use env_logger::{Builder, Env};
use std::io::Write;

/// Installs the process logger. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) {
    let result = Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::debug!("Logger initialized at '{}'.", default_level);
    }
}
