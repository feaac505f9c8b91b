//! # VaultShare Testkit
//!
//! Testing utilities for VaultShare.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a store on a manual clock with a share manager, team
//!   directory and in-memory entry and user directories wired to it
//! - **Generators**: Proptest strategies for property-based testing
//!
//! The scenario tests under `tests/` exercise the share lifecycle against
//! both store backends.
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use vaultshare::ShareConfig;
//! use vaultshare_testkit::generators::ShareParams;
//!
//! proptest! {
//!     #[test]
//!     fn generated_requests_validate(params: ShareParams) {
//!         prop_assert!(params.request().validate(&ShareConfig::default()).is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use vaultshare_testkit::fixtures::TestFixture;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let fixture = TestFixture::new();
//! let team = fixture.add_team("ops", &["alice"]).await.unwrap();
//! let entry = fixture.add_entry(team.id).await;
//! assert_eq!(entry.team_id, team.id);
//! # });
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    init_tracing, random_access_key, random_pass, StaticEntries, StaticUsers, TestFixture,
};
pub use generators::ShareParams;
