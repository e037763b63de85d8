//! `log` backend: browser console on wasm, `env_logger` elsewhere.

use log::LevelFilter;

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, Metadata, Record};

    pub struct ConsoleLogger;

    pub static LOGGER: ConsoleLogger = ConsoleLogger;

    impl log::Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record<'_>) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let msg = wasm_bindgen::JsValue::from_str(&format!(
                "[flextable {}] {}",
                record.level(),
                record.args()
            ));
            match record.level() {
                Level::Error => web_sys::console::error_1(&msg),
                Level::Warn => web_sys::console::warn_1(&msg),
                Level::Info => web_sys::console::info_1(&msg),
                Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
            }
        }

        fn flush(&self) {}
    }
}

/// Wall-clock milliseconds, for render timings.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

/// Install the console logger. Later calls only adjust the level.
#[cfg(target_arch = "wasm32")]
pub fn init(level: LevelFilter) {
    if log::set_logger(&console::LOGGER).is_err() {
        log::debug!("logger already installed");
    }
    log::set_max_level(level);
}

/// Install `env_logger` at a fixed level. Later calls only adjust the level.
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LevelFilter) {
    if env_logger::Builder::new()
        .filter_level(level)
        .try_init()
        .is_err()
    {
        log::debug!("logger already installed");
    }
    log::set_max_level(level);
}

/// Install `env_logger` with filters read from `var`, e.g. `FLEXTABLE_LOG=debug`.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_from_env(var: &str, default: &str) {
    let env = env_logger::Env::default().filter_or(var, default);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already installed");
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init(LevelFilter::Warn);
        init(LevelFilter::Error);
        assert_eq!(log::max_level(), LevelFilter::Error);
        init_from_env("FLEXTABLE_TEST_LOG", "warn");
        assert_eq!(log::max_level(), LevelFilter::Error);
    }
}
