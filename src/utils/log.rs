// src/utils/log.rs

//! Pipeline-style log formatting on top of the `log` facade.
//!
//! Binaries install `env_logger`; these helpers only shape the messages.

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {}/{}] {}", step_num, total, message);
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a success message
pub fn success(message: &str) {
    log::info!("✓ {}", message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

/// Log a warning
pub fn warn(message: &str) {
    log::warn!("⚠ {}", message);
}

/// Log an error
pub fn error(message: &str) {
    log::error!("✗ {}", message);
}
