//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `summit_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("summit_core ping={}", summit_core::ping());
    println!("summit_core version={}", summit_core::core_version());
}
