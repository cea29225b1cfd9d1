//! kselect-lib: package-list driven Kconfig resolution.
//!
//! - `kconfig`: schema reader, value semantics and `.config` I/O
//! - `packages`: package list to symbol names
//! - `resolve`: dependency-enabling walk and conflict detection
//! - `pipeline`: the full run, from settings to finalize command

pub mod consts;
pub mod discovery;
pub mod finalize;
pub mod kconfig;
pub mod packages;
pub mod pipeline;
pub mod resolve;
pub mod settings;
