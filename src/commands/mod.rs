//! CLI command handlers.

mod lookup;
mod screen;

pub use lookup::{run_lookup_loop, LookupCommand};
pub use screen::{prompt_liquidity_filter, run_screen};
