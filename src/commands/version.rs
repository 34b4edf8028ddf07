use std::collections::HashMap;

use crate::plugin::Info;

/// Plugin info printed when no CNI_COMMAND is given.
pub fn info() -> Info {
    let extra = HashMap::from([
        ("build_time".to_string(), env!("VERGEN_BUILD_TIMESTAMP").to_string()),
        ("target".to_string(), env!("VERGEN_CARGO_TARGET_TRIPLE").to_string()),
        ("rustc".to_string(), env!("VERGEN_RUSTC_SEMVER").to_string()),
    ]);
    Info::new(env!("CARGO_PKG_VERSION").to_string(), Some(extra))
}
