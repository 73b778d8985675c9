//! The flag translator.
//!
//! Walks the recipe's flag tables in declaration order against a validated
//! configuration and produces the final list of build definitions. The
//! output ordering is stable across runs so generated build invocations are
//! reproducible.

use crate::core::configuration::Configuration;
use crate::core::define::{DefineRule, DefineValue};
use crate::core::recipe::Recipe;
use crate::core::variant::VariantValue;
use crate::flags::define::BuildDefine;
use crate::registry::PackageResolver;
use crate::resolver::errors::ConfigError;

/// Translate a validated configuration into ordered build definitions.
///
/// The caller is expected to run
/// [`validate`](crate::resolver::evaluate::validate) first; translation
/// performs only the checks that belong to it — the accelerator
/// architecture requirement and installed-package resolution.
pub fn translate(
    recipe: &Recipe,
    config: &Configuration,
    resolver: &dyn PackageResolver,
) -> Result<Vec<BuildDefine>, ConfigError> {
    let mut defines = Vec::new();

    for rule in recipe.defines() {
        match rule {
            DefineRule::FromVariant { key, variant, when } => {
                if !when.matches_config(config) {
                    continue;
                }
                defines.push(BuildDefine::new(key, variant_value(config, variant)));
            }

            DefineRule::Set { key, value, when } => {
                if !when.matches_config(config) {
                    continue;
                }
                defines.push(BuildDefine::new(key, value.clone()));
            }

            DefineRule::ArchList { key, variant, gate } => {
                if !config.enabled(gate) {
                    continue;
                }
                let tokens = config.tokens(variant).cloned().unwrap_or_default();
                if tokens.is_empty() {
                    return Err(ConfigError::MissingRequiredOption {
                        variant: variant.clone(),
                        reason: format!(
                            "`{}` is enabled but no `{}` value is set",
                            gate, variant
                        ),
                    });
                }
                defines.push(BuildDefine::new(
                    key,
                    DefineValue::List(tokens.into_iter().collect()),
                ));
            }

            DefineRule::DepLibraries { key, package, when } => {
                if !when.matches_config(config) {
                    continue;
                }
                let installed = resolver.resolve(package, None)?;
                defines.push(BuildDefine::new(
                    key,
                    DefineValue::List(installed.libraries),
                ));
            }
        }
    }

    // Dependency directories are version-dispatched: older releases build
    // some dependencies internally and take their locations as inputs,
    // newer ones consume externally-built packages.
    for layout in recipe.dir_layouts() {
        if !layout.when.matches(config.version()) {
            continue;
        }
        for entry in &layout.entries {
            if !entry.when.matches_config(config) {
                continue;
            }
            let installed = resolver.resolve(&entry.package, None)?;
            tracing::debug!(
                "dependency directory {} -> {}",
                entry.key,
                installed.prefix.display()
            );
            defines.push(BuildDefine::new(
                &entry.key,
                DefineValue::Text(installed.prefix.display().to_string()),
            ));
        }
    }

    Ok(defines)
}

/// Read a variant as a define value. Variants absent at the selected
/// version render as OFF.
fn variant_value(config: &Configuration, variant: &str) -> DefineValue {
    match config.get(variant) {
        None => DefineValue::Bool(false),
        Some(VariantValue::Bool(b)) => DefineValue::Bool(*b),
        Some(VariantValue::Choice(c)) => DefineValue::Text(c.clone()),
        Some(VariantValue::Tokens(t)) => DefineValue::List(t.iter().cloned().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::ConfigSpec;
    use crate::core::version::PackageVersion;
    use crate::registry::{InMemoryResolver, InstalledPackage};
    use crate::recipes;

    fn config(spec: &str) -> Configuration {
        let recipe = recipes::palace();
        let spec: ConfigSpec = spec.parse().unwrap();
        Configuration::from_spec(&recipe, &spec).unwrap()
    }

    /// Installed metadata covering every package the flag tables resolve.
    fn site_resolver() -> InMemoryResolver {
        let mut resolver = InMemoryResolver::new();
        for (name, version, prefix, libraries) in [
            ("blas", (0, 3, 27), "/opt/sw/openblas", vec!["libopenblas.so"]),
            ("lapack", (0, 3, 27), "/opt/sw/openblas", vec!["liblapack.so"]),
            ("libxsmm", (1, 17, 0), "/opt/sw/libxsmm", vec![]),
            ("magma", (2, 8, 0), "/opt/sw/magma", vec![]),
            ("libceed", (0, 13, 0), "/opt/sw/libceed", vec![]),
            ("gslib", (1, 0, 9), "/opt/sw/gslib", vec![]),
        ] {
            let (major, minor, patch) = version;
            resolver.register(
                InstalledPackage::new(
                    name,
                    PackageVersion::release(major, minor, patch),
                    prefix,
                )
                .with_libraries(libraries),
            );
        }
        resolver
    }

    fn flags(spec: &str) -> Vec<BuildDefine> {
        let recipe = recipes::palace();
        translate(&recipe, &config(spec), &site_resolver()).unwrap()
    }

    fn value_of<'a>(defines: &'a [BuildDefine], key: &str) -> &'a DefineValue {
        &defines
            .iter()
            .find(|d| d.key == key)
            .unwrap_or_else(|| panic!("no define for `{}`", key))
            .value
    }

    #[test]
    fn test_exact_flag_ordering() {
        let defines = flags("palace@0.13.0");
        let keys: Vec<&str> = defines.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "CMAKE_BUILD_TYPE",
                "BUILD_SHARED_LIBS",
                "PALACE_WITH_64BIT_INT",
                "PALACE_WITH_ARPACK",
                "PALACE_WITH_CUDA",
                "PALACE_WITH_GSLIB",
                "PALACE_WITH_HIP",
                "PALACE_WITH_LIBXSMM",
                "PALACE_WITH_MUMPS",
                "PALACE_WITH_OPENMP",
                "PALACE_WITH_SLEPC",
                "PALACE_WITH_STRUMPACK",
                "PALACE_WITH_SUNDIALS",
                "PALACE_WITH_SUPERLU",
                "PALACE_BUILD_EXTERNAL_DEPS",
                "HYPRE_REQUIRED_PACKAGES",
                "BLAS_LIBRARIES",
                "LAPACK_LIBRARIES",
                "SuperLUDist_REQUIRED_PACKAGES",
                "LIBXSMM_DIR",
            ]
        );
    }

    #[test]
    fn test_variant_values_rendered() {
        let defines = flags("palace@0.13.0 ~shared +int64");
        assert_eq!(value_of(&defines, "BUILD_SHARED_LIBS"), &DefineValue::Bool(false));
        assert_eq!(
            value_of(&defines, "PALACE_WITH_64BIT_INT"),
            &DefineValue::Bool(true)
        );
        assert_eq!(
            value_of(&defines, "CMAKE_BUILD_TYPE"),
            &DefineValue::Text("RelWithDebInfo".into())
        );
    }

    #[test]
    fn test_inapplicable_variant_renders_off() {
        // sundials does not exist at 0.13 but its toggle flag is still emitted
        let defines = flags("palace@0.13.0");
        assert_eq!(
            value_of(&defines, "PALACE_WITH_SUNDIALS"),
            &DefineValue::Bool(false)
        );
    }

    #[test]
    fn test_cuda_arch_list_emitted() {
        let defines = flags("palace@0.13.0 +cuda cuda_arch=80,90");
        assert_eq!(
            value_of(&defines, "CMAKE_CUDA_ARCHITECTURES"),
            &DefineValue::List(vec!["80".into(), "90".into()])
        );
        // MAGMA_DIR comes from the pre-0.14 layout for GPU builds
        assert_eq!(
            value_of(&defines, "MAGMA_DIR"),
            &DefineValue::Text("/opt/sw/magma".into())
        );
    }

    #[test]
    fn test_missing_cuda_arch_fails() {
        let recipe = recipes::palace();
        let err = translate(
            &recipe,
            &config("palace@0.13.0 +cuda"),
            &site_resolver(),
        )
        .unwrap_err();
        match err {
            ConfigError::MissingRequiredOption { variant, .. } => {
                assert_eq!(variant, "cuda_arch");
            }
            other => panic!("expected missing option, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_amdgpu_target_fails() {
        let recipe = recipes::palace();
        let err = translate(
            &recipe,
            &config("palace@0.13.0 +rocm"),
            &site_resolver(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRequiredOption { .. }
        ));
    }

    #[test]
    fn test_version_dispatched_directories() {
        // Pre-0.14: internally-built libCEED takes LIBXSMM_DIR (and
        // MAGMA_DIR for GPU builds) as inputs
        let old = flags("palace@0.13.0");
        assert!(old.iter().any(|d| d.key == "LIBXSMM_DIR"));
        assert!(old.iter().all(|d| d.key != "LIBCEED_DIR"));
        assert!(old.iter().all(|d| d.key != "GSLIB_DIR"));

        // From 0.14: externally-built libceed and gslib supply their own
        // prefixes
        let new = flags("palace@0.14.0");
        assert!(new.iter().all(|d| d.key != "LIBXSMM_DIR"));
        assert_eq!(
            value_of(&new, "LIBCEED_DIR"),
            &DefineValue::Text("/opt/sw/libceed".into())
        );
        assert_eq!(
            value_of(&new, "GSLIB_DIR"),
            &DefineValue::Text("/opt/sw/gslib".into())
        );
    }

    #[test]
    fn test_development_version_uses_external_layout() {
        let defines = flags("palace@develop");
        assert!(defines.iter().any(|d| d.key == "LIBCEED_DIR"));
        assert!(defines.iter().all(|d| d.key != "LIBXSMM_DIR"));
    }

    #[test]
    fn test_required_packages_follow_solvers() {
        let defines = flags("palace@0.13.0 +mumps +strumpack");
        assert_eq!(
            value_of(&defines, "STRUMPACK_REQUIRED_PACKAGES"),
            &DefineValue::List(vec![
                "LAPACK".into(),
                "BLAS".into(),
                "MPI".into(),
                "MPI_Fortran".into()
            ])
        );
        assert!(defines.iter().any(|d| d.key == "MUMPS_REQUIRED_PACKAGES"));

        let defines = flags("palace@0.13.0 ~superlu-dist +mumps");
        assert!(defines
            .iter()
            .all(|d| d.key != "SuperLUDist_REQUIRED_PACKAGES"));
    }

    #[test]
    fn test_blas_lapack_libraries_resolved() {
        let defines = flags("palace@0.13.0");
        assert_eq!(
            value_of(&defines, "BLAS_LIBRARIES"),
            &DefineValue::List(vec!["libopenblas.so".into()])
        );
        assert_eq!(
            value_of(&defines, "HYPRE_REQUIRED_PACKAGES"),
            &DefineValue::List(vec!["LAPACK".into(), "BLAS".into()])
        );
    }

    #[test]
    fn test_unresolvable_package_propagates() {
        let recipe = recipes::palace();
        let err = translate(
            &recipe,
            &config("palace@0.13.0"),
            &InMemoryResolver::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvableDependency { .. }));
    }

    #[test]
    fn test_translation_is_reproducible() {
        let first = flags("palace@0.13.0 +cuda cuda_arch=80 +mumps");
        let second = flags("palace@0.13.0 +cuda cuda_arch=80 +mumps");
        assert_eq!(first, second);
    }
}
