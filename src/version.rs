/// Version string reported by `--version` and the run log header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
