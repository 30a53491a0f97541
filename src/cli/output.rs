//! Output-mode helpers shared by the CLI commands.
//!
//! The global flags are exported as environment variables by `main` so any
//! module can check them without threading them through call chains.

/// Whether non-essential output is suppressed (`--quiet`).
pub fn is_quiet() -> bool {
    std::env::var("CHRONOSWEEP_QUIET").is_ok()
}

/// Whether machine-readable JSON output was requested (`--json`).
pub fn is_json() -> bool {
    std::env::var("CHRONOSWEEP_JSON").is_ok()
}

/// Print a JSON value on stdout.
pub fn print_json(value: &serde_json::Value) {
    println!("{value}");
}
