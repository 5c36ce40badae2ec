//! Test utilities for the protree workspace
//!
//! Common helpers shared by the workspace crates' tests.
//!
//! # Features
//!
//! - **Test Environment**: Isolated test environments with automatic cleanup
//! - **Fixtures**: Protein sets and FASTA files
//! - **Assertions**: Checks for peptide mappings

pub mod assertions;
pub mod environment;
pub mod fixtures;

// Re-export commonly used items
pub use environment::{TestConfig, TestEnvironment};
pub use fixtures::{
    create_test_fasta, generate_proteins, sample_peptides, sample_proteins, TestProteins,
};

// Re-export test dependencies for convenience
pub use anyhow::{Context, Result};
pub use tempfile;

/// Initialize test logging (call once per test module)
///
/// Respects `PROTREE_LOG`, defaulting to warnings only.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("PROTREE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Run a test with a clean environment
///
/// # Example
/// ```rust
/// use protree_test::with_test_env;
///
/// with_test_env(|env| {
///     let fasta = env.write_file("fasta/db.fasta", b">P1\nPEPTIDEK\n")?;
///     assert!(fasta.exists());
///     Ok(())
/// })
/// .unwrap();
/// ```
pub fn with_test_env<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&TestEnvironment) -> Result<R>,
{
    let env = TestEnvironment::new()?;
    f(&env)
}

/// Run a test with a configured environment
pub fn with_configured_env<F, R>(config: TestConfig, f: F) -> Result<R>
where
    F: FnOnce(&TestEnvironment) -> Result<R>,
{
    let env = TestEnvironment::with_config(config)?;
    f(&env)
}
