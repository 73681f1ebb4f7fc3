//! druid: a small dynamically-typed scripting language whose variables can
//! be *derived* (`b <- a * 2;`) and then follow their inputs automatically,
//! including inputs that change outside the program (signals such as
//! `$file('data.txt')`).
//!
//! The pipeline is [`lexer`] → [`parser`] → [`interpreter`]; [`diagnostic`]
//! renders whatever stops it.

pub mod ast;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=druid=debug` (derive
/// bindings, recomputation, signals) or `RUST_LOG=druid=trace` (calls).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
