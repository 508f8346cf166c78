/// Logs the message at `error` level and panics with it.
///
/// Used where a broken route table must stop application startup.
#[macro_export]
macro_rules! log_panic {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
        core::panic!($($arg)*)
    }}
}
