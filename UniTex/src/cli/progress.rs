//! CLI progress display utilities
//!
//! Step indicators with emojis, and progress bars for batch operations.

use std::time::Duration;

use console::{Emoji, style};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};

// =============================================================================
// Emoji Constants (with ASCII fallbacks for terminals without emoji support)
// =============================================================================

/// Magnifying glass - for reading/scanning operations
pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
/// Floppy disk - for writing/saving operations
pub static DISK: Emoji<'_, '_> = Emoji("💾 ", "");
/// Gear - for encoding/conversion operations
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
/// Sparkles - for completion
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");
/// Picture - for texture/image operations
pub static PICTURE: Emoji<'_, '_> = Emoji("🖼️  ", "");
/// Rewind - for restore operations
pub static REWIND: Emoji<'_, '_> = Emoji("⏪ ", "");

// =============================================================================
// Step-Based Progress
// =============================================================================

/// Print a step indicator: `[1/3] 🔍 Message...`
pub fn print_step(current: usize, total: usize, emoji: Emoji, msg: &str) {
    println!(
        "{} {}{}",
        style(format!("[{current}/{total}]")).bold().dim(),
        emoji,
        msg
    );
}

/// Print completion message: `✨ Done in 2s`
pub fn print_done(elapsed: Duration) {
    println!("{} Done in {}", SPARKLE, HumanDuration(elapsed));
}

// =============================================================================
// Progress Styles
// =============================================================================

/// Progress bar style for determinate progress
///
/// Format: `Exporting [████████░░░░░░░░] 50/100`
///
/// # Panics
/// Panics if the template string is invalid (this is a compile-time constant).
#[must_use]
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
        .expect("valid template")
        .progress_chars("█░ ")
}

/// Create a simple progress bar
#[must_use]
pub fn simple_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(bar_style());
    pb.set_message(msg.to_string());
    pb
}

/// Create a simple spinner
///
/// # Panics
/// Panics if the template string is invalid (this is a compile-time constant).
#[must_use]
pub fn simple_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
