use anyhow::Result;
use vergen::{vergen, Config};

fn main() -> Result<()> {
    // Emits VERGEN_BUILD_*, VERGEN_CARGO_* and VERGEN_RUSTC_* for the plugin info output.
    vergen(Config::default())
}
