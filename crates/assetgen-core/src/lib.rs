//! # assetgen-core
//!
//! Build-time generators that turn external files into C++ sources.
//!
//! This crate provides the core functionality for:
//! - Embedding arbitrary files (fonts, images, license texts, JSON) as
//!   `unsigned char const` arrays with a paired declaration header
//! - Compiling a `services(5)` registry into canonical TCP/UDP port tables
//!   rendered as C++ source or JSON
//!
//! ## Architecture
//!
//! - [`embed`]: Asset reading, byte-array formatting and the embedding compiler
//! - [`services`]: Registry parsing and service table rendering
//! - [`manifest`]: TOML manifest describing an embedding run
//! - [`output`]: Atomic writing of generated artifacts
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use assetgen_core::{AssetEntry, RenderFormat, ResourceCompiler, ServiceCompiler};
//! use std::path::Path;
//!
//! let entries = [
//!     AssetEntry::new("Thirdparty/jetbrains-mono/JetBrainsMono-Regular.ttf", "Font"),
//!     AssetEntry::new("Meta/Icon.png", "Icon"),
//! ];
//! ResourceCompiler::new()
//!     .compile("Assets", &entries)?
//!     .write_to(Path::new("Source/Gui"))?;
//!
//! ServiceCompiler::new(RenderFormat::Json)
//!     .compile("/etc/services")?
//!     .write_to("Meta/BuiltinProtocolDB.json")?;
//! # Ok::<(), assetgen_core::Error>(())
//! ```
//!
//! Both generators are all-or-nothing: every input is read and every
//! artifact rendered in memory before anything is written.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod embed;
pub mod error;
pub mod manifest;
pub mod output;
pub mod services;

// Re-export primary types for convenience
pub use embed::{AssetBlob, AssetEntry, EmbedConfig, EmbedOutput, ResourceCompiler, SymbolNames};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use output::{write_artifacts, Artifact};
pub use services::{
    Protocol, RegistryParser, RenderFormat, ServiceCompiler, ServiceDatabase, ServiceEntry,
    ServiceRenderer, ServiceTable,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
