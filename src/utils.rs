//! 控制台日志与 panic hook。

/// 输出到浏览器控制台；非 wasm 目标（本地单元测试）下不输出。
#[cfg(target_arch = "wasm32")]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log(message: &str) {
    let _ = message;
}

#[cfg(target_arch = "wasm32")]
pub fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(message: &str) {
    let _ = message;
}

macro_rules! console_log {
    ($($t:tt)*) => ($crate::utils::log(&format!($($t)*)))
}

macro_rules! console_warn {
    ($($t:tt)*) => ($crate::utils::warn(&format!($($t)*)))
}

pub(crate) use console_log;
pub(crate) use console_warn;

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}
