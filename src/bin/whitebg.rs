//! whitebg CLI
//!
//! Replaces near-uniform portrait backgrounds with a solid color.

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    whitebg::cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
