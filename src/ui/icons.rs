//! Console icons for command output. Each falls back to plain text on
//! terminals without emoji support.

use console::Emoji;

// Outcomes
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");

// Grid
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "#");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "-");
pub static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "?");
pub static GRIP: Emoji<'_, '_> = Emoji("⠿ ", "=");
