//! CLI progress display utilities

use std::time::Duration;

use console::{Emoji, style};
use indicatif::HumanDuration;

/// Package - for extraction operations
pub static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "");
/// Sparkles - for completion
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");
/// Warning sign - for failures
pub static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "");

/// Print a step indicator: `[1/3] 📦 Message...`
pub fn print_step(current: usize, total: usize, emoji: Emoji, msg: &str) {
    println!(
        "{} {}{}",
        style(format!("[{current}/{total}]")).bold().dim(),
        emoji,
        msg
    );
}

/// Print the run totals: `3 extracted, 1 failed`
pub fn print_summary(succeeded: usize, failed: usize) {
    if failed == 0 {
        println!("{}", style(format!("{succeeded} extracted")).green());
    } else {
        println!(
            "{}{}, {}",
            WARNING,
            style(format!("{succeeded} extracted")).green(),
            style(format!("{failed} failed")).red()
        );
    }
}

/// Print completion message: `✨ Done in 2s`
pub fn print_done(elapsed: Duration) {
    println!("{} Done in {}", SPARKLE, HumanDuration(elapsed));
}
