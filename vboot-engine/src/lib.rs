//! Verified-boot decision engine.
//!
//! `no_std` by default (no heap, no host OS assumptions) so it can run in
//! the same bare-metal boot context the teacher's `bao1x-boot` crate does;
//! built with `std` under `cfg(test)` or the `std` feature for the test
//! harness's fixtures and `quickcheck` properties.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod bootpath;
pub mod commit;
pub mod context;
pub mod crc8;
pub mod digest;
pub mod error;
pub mod firmware;
pub mod gbb;
pub mod hal;
pub mod keys;
pub mod kernel;
pub mod nvdata;
pub mod rollback;
pub mod secdata;
pub mod shared_state;
pub mod structs;
#[cfg(any(test, feature = "std"))]
pub mod test_support;
pub mod workbuf;

pub use context::Context;
pub use error::{VbError, VbResult};
