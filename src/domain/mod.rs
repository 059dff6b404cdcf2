//! Domain logic and core data structures
//!
//! This module contains the occlusion geometry engine. It is pure
//! computation over plain values and has no knowledge of Win32.

pub mod core;
pub mod occlusion;
pub mod query;
pub mod region;
pub mod surface;
