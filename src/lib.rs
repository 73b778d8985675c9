//! Caravel - A declarative package-variant resolver and build-flag generator
//!
//! This crate provides the core library functionality for Caravel:
//! recipe declaration, configuration validation against conflict tables,
//! conditional dependency derivation, and translation of validated
//! configurations into ordered build-tool definitions.

pub mod core;
pub mod flags;
pub mod recipes;
pub mod registry;
pub mod resolver;
pub mod util;

pub use crate::core::{
    configuration::Configuration, recipe::Recipe, spec::ConfigSpec, variant::VariantValue,
    version::PackageVersion,
};

pub use flags::{translate, BuildDefine};
pub use registry::{InMemoryResolver, InstalledPackage, PackageResolver};
pub use resolver::{validate, ConfigError};
pub use util::Config;
