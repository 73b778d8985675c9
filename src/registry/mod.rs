//! Installed-package resolution.
//!
//! Flag translation and dependency-variant rules need metadata about
//! already-installed packages: install prefix, library list, and the
//! variant assignment they were built with. That resolution is the
//! packaging framework's job, so it sits behind the [`PackageResolver`]
//! trait; Caravel ships an [`InMemoryResolver`] backed by a TOML packages
//! file for CLI use and tests.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::requirement::DepVersionReq;
use crate::core::variant::VariantValue;
use crate::core::version::PackageVersion;

/// Metadata for one installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package name
    pub name: String,

    /// Installed version
    pub version: PackageVersion,

    /// Install prefix
    pub prefix: PathBuf,

    /// Link libraries provided by the package, in link order
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Variant assignment the package was built with
    #[serde(default)]
    pub variants: BTreeMap<String, VariantValue>,
}

impl InstalledPackage {
    /// Create installed-package metadata.
    pub fn new(
        name: impl Into<String>,
        version: PackageVersion,
        prefix: impl Into<PathBuf>,
    ) -> Self {
        InstalledPackage {
            name: name.into(),
            version,
            prefix: prefix.into(),
            libraries: Vec::new(),
            variants: BTreeMap::new(),
        }
    }

    /// Attach the library list.
    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries = libraries.into_iter().map(Into::into).collect();
        self
    }

    /// Record a variant the package was built with.
    pub fn with_variant(mut self, name: impl Into<String>, value: VariantValue) -> Self {
        self.variants.insert(name.into(), value);
        self
    }

    /// Look up a build variant.
    pub fn variant(&self, name: &str) -> Option<&VariantValue> {
        self.variants.get(name)
    }
}

impl fmt::Display for InstalledPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.prefix.display())
    }
}

/// Error resolving an installed package.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("package `{package}` is not registered")]
    NotFound {
        package: String,
        available: Vec<String>,
    },

    #[error("package `{package}` is installed at {found} but {requirement} is required")]
    VersionMismatch {
        package: String,
        found: String,
        requirement: String,
    },

    #[error("failed to read packages file `{path}`")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse packages file `{path}`")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Resolution of installed packages, provided by the packaging framework.
pub trait PackageResolver {
    /// Resolve a package by name, optionally checking a version constraint.
    fn resolve(
        &self,
        package: &str,
        version: Option<&DepVersionReq>,
    ) -> Result<InstalledPackage, RegistryError>;
}

/// Packages-file schema: a `[packages.<name>]` table per entry.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PackagesFile {
    #[serde(default)]
    packages: BTreeMap<String, PackagesFileEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PackagesFileEntry {
    version: PackageVersion,
    prefix: PathBuf,
    #[serde(default)]
    libraries: Vec<String>,
    #[serde(default)]
    variants: BTreeMap<String, VariantValue>,
}

/// An in-memory resolver over a fixed set of installed packages.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    packages: BTreeMap<String, InstalledPackage>,
}

impl InMemoryResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        InMemoryResolver::default()
    }

    /// Register an installed package, replacing any previous entry.
    pub fn register(&mut self, package: InstalledPackage) {
        self.packages.insert(package.name.clone(), package);
    }

    /// Load from packages-file TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let file: PackagesFile = toml::from_str(text)?;
        let mut resolver = InMemoryResolver::new();
        for (name, entry) in file.packages {
            resolver.register(InstalledPackage {
                name,
                version: entry.version,
                prefix: entry.prefix,
                libraries: entry.libraries,
                variants: entry.variants,
            });
        }
        Ok(resolver)
    }

    /// Load from a packages file on disk.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| RegistryError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if no packages are registered.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageResolver for InMemoryResolver {
    fn resolve(
        &self,
        package: &str,
        version: Option<&DepVersionReq>,
    ) -> Result<InstalledPackage, RegistryError> {
        let found = self
            .packages
            .get(package)
            .ok_or_else(|| RegistryError::NotFound {
                package: package.to_string(),
                available: self.packages.keys().cloned().collect(),
            })?;

        if let Some(req) = version {
            if !req.matches(&found.version) {
                return Err(RegistryError::VersionMismatch {
                    package: package.to_string(),
                    found: found.version.to_string(),
                    requirement: req.to_string(),
                });
            }
        }

        Ok(found.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGES: &str = r#"
        [packages.openblas]
        version = "0.3.27"
        prefix = "/opt/sw/openblas-0.3.27"
        libraries = ["libopenblas.so"]

        [packages.mumps]
        version = "5.6.2"
        prefix = "/opt/sw/mumps-5.6.2"
        variants = { int64 = false, shared = true }
    "#;

    #[test]
    fn test_load_packages_file() {
        let resolver = InMemoryResolver::from_toml_str(PACKAGES).unwrap();
        assert_eq!(resolver.len(), 2);

        let blas = resolver.resolve("openblas", None).unwrap();
        assert_eq!(blas.libraries, vec!["libopenblas.so"]);

        let mumps = resolver.resolve("mumps", None).unwrap();
        assert_eq!(mumps.variant("int64"), Some(&VariantValue::Bool(false)));
    }

    #[test]
    fn test_not_found_lists_available() {
        let resolver = InMemoryResolver::from_toml_str(PACKAGES).unwrap();
        let err = resolver.resolve("petsc", None).unwrap_err();
        match err {
            RegistryError::NotFound { available, .. } => {
                assert!(available.contains(&"mumps".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_version_constraint_checked() {
        let resolver = InMemoryResolver::from_toml_str(PACKAGES).unwrap();
        let req: DepVersionReq = ">=6".parse().unwrap();
        let err = resolver.resolve("mumps", Some(&req)).unwrap_err();
        assert!(matches!(err, RegistryError::VersionMismatch { .. }));

        let req: DepVersionReq = ">=5".parse().unwrap();
        assert!(resolver.resolve("mumps", Some(&req)).is_ok());
    }
}
