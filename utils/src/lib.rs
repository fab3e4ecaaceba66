//! Shared infrastructure utilities for intake.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename), used for drafts

pub mod atomic_write;

pub use atomic_write::{
    AtomicWriteOptions, SyncPolicy, Visibility, atomic_write, atomic_write_with_options,
    recover_bak_file,
};
