//! Dependency requirement derivation.
//!
//! Expands a recipe's conditional dependency table against a configuration
//! into the concrete list of requests the packaging framework would be
//! asked to satisfy. Declaration order is preserved so the output is stable
//! across runs.

use crate::core::configuration::Configuration;
use crate::core::recipe::Recipe;
use crate::core::requirement::DependencyRequest;

/// Derive all applicable dependency requests for a configuration.
pub fn requirements(recipe: &Recipe, config: &Configuration) -> Vec<DependencyRequest> {
    recipe
        .dependencies()
        .iter()
        .filter_map(|req| req.resolve(config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::ConfigSpec;
    use crate::core::variant::VariantValue;
    use crate::recipes;

    fn derive(spec: &str) -> Vec<DependencyRequest> {
        let recipe = recipes::palace();
        let spec: ConfigSpec = spec.parse().unwrap();
        let config = Configuration::from_spec(&recipe, &spec).unwrap();
        requirements(&recipe, &config)
    }

    fn find<'a>(requests: &'a [DependencyRequest], name: &str) -> &'a DependencyRequest {
        requests
            .iter()
            .find(|r| r.package == name)
            .unwrap_or_else(|| panic!("no request for `{}`", name))
    }

    #[test]
    fn test_int64_pins_metis_sub_variant() {
        let requests = derive("palace@0.13.0 +int64");
        let metis = find(&requests, "metis");
        assert_eq!(metis.variant("int64"), Some(&VariantValue::Bool(true)));

        let requests = derive("palace@0.13.0 ~int64");
        let metis = find(&requests, "metis");
        assert_eq!(metis.variant("int64"), Some(&VariantValue::Bool(false)));
    }

    #[test]
    fn test_int64_becomes_hypre_mixedint() {
        let requests = derive("palace@0.13.0 +int64");
        let hypre = find(&requests, "hypre");
        assert_eq!(hypre.variant("mixedint"), Some(&VariantValue::Bool(true)));
        assert!(hypre.variant("int64").is_none());
    }

    #[test]
    fn test_disabled_solver_not_requested() {
        let requests = derive("palace@0.13.0");
        assert!(requests.iter().all(|r| r.package != "mumps"));
        assert!(requests.iter().all(|r| r.package != "strumpack"));

        let requests = derive("palace@0.13.0 +mumps");
        let mumps = find(&requests, "mumps");
        assert_eq!(mumps.variant("metis"), Some(&VariantValue::Bool(true)));
        assert_eq!(mumps.variant("parmetis"), Some(&VariantValue::Bool(true)));
    }

    #[test]
    fn test_slepc_brings_petsc() {
        let requests = derive("palace@0.13.0");
        let slepc = find(&requests, "slepc");
        assert_eq!(slepc.variant("arpack"), Some(&VariantValue::Bool(false)));

        let petsc = find(&requests, "petsc");
        assert_eq!(petsc.variant("mpi"), Some(&VariantValue::Bool(true)));
        assert_eq!(petsc.variant("complex"), Some(&VariantValue::Bool(true)));

        let requests = derive("palace@0.13.0 ~slepc +arpack");
        assert!(requests.iter().all(|r| r.package != "petsc"));
        assert!(requests.iter().all(|r| r.package != "slepc"));
    }

    #[test]
    fn test_single_arpack_requirement() {
        let requests = derive("palace@0.13.0 +arpack");
        let arpack: Vec<_> = requests
            .iter()
            .filter(|r| r.package == "arpack-ng")
            .collect();
        assert_eq!(arpack.len(), 1);
        assert_eq!(arpack[0].variant("mpi"), Some(&VariantValue::Bool(true)));
        assert_eq!(arpack[0].variant("icb"), Some(&VariantValue::Bool(true)));
        assert_eq!(arpack[0].version.as_ref().unwrap().to_string(), "=develop");
    }

    #[test]
    fn test_gpu_arch_forwarded_to_solver_stack() {
        let requests = derive("palace@0.13.0 +cuda cuda_arch=80,90");
        for name in ["hypre", "magma", "superlu-dist", "petsc", "slepc"] {
            let request = find(&requests, name);
            assert_eq!(
                request.variant("cuda"),
                Some(&VariantValue::Bool(true)),
                "{} should inherit +cuda",
                name
            );
            assert_eq!(
                request.variant("cuda_arch"),
                Some(&VariantValue::tokens(["80", "90"])),
                "{} should inherit cuda_arch",
                name
            );
        }
    }

    #[test]
    fn test_magma_only_for_gpu_builds() {
        let requests = derive("palace@0.13.0");
        assert!(requests.iter().all(|r| r.package != "magma"));

        let requests = derive("palace@0.13.0 +rocm amdgpu_target=gfx90a");
        assert!(requests.iter().any(|r| r.package == "magma"));
    }

    #[test]
    fn test_version_gated_dependencies() {
        let old = derive("palace@0.13.0");
        assert!(old.iter().all(|r| r.package != "libceed"));
        assert!(old.iter().all(|r| r.package != "sundials"));

        let new = derive("palace@0.14.0");
        assert!(new.iter().any(|r| r.package == "libceed"));
        assert!(new.iter().any(|r| r.package == "sundials"));
        assert!(new.iter().any(|r| r.package == "gslib"));
    }

    #[test]
    fn test_libxsmm_debug_follows_build_type() {
        let requests = derive("palace@0.13.0 build_type=Debug");
        let libxsmm = find(&requests, "libxsmm");
        assert_eq!(libxsmm.variant("debug"), Some(&VariantValue::Bool(true)));

        let requests = derive("palace@0.13.0");
        let libxsmm = find(&requests, "libxsmm");
        assert!(libxsmm.variant("debug").is_none());
    }

    #[test]
    fn test_build_tools_marked_build_only() {
        let requests = derive("palace@0.13.0");
        assert!(find(&requests, "cmake").build_only);
        assert!(find(&requests, "pkgconfig").build_only);
        assert!(!find(&requests, "mpi").build_only);
    }

    #[test]
    fn test_declaration_order_is_stable() {
        let first = derive("palace@0.13.0 +mumps +strumpack");
        let second = derive("palace@0.13.0 +mumps +strumpack");
        let names: Vec<_> = first.iter().map(|r| r.package.as_str()).collect();
        assert_eq!(
            names,
            second.iter().map(|r| r.package.as_str()).collect::<Vec<_>>()
        );
    }
}
