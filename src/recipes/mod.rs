//! Built-in recipe catalog.
//!
//! The catalog is a process-wide read-only table initialized on first use.
//! It currently carries one recipe: `palace`, a 3D finite element solver
//! for computational electromagnetics with a large solver-library
//! dependency graph (MPI, sparse direct solvers, eigensolvers, GPU
//! backends).

use std::sync::LazyLock;

use crate::core::define::{DefineRule, DefineValue, DirEntry, DirLayout};
use crate::core::predicate::Predicate;
use crate::core::recipe::Recipe;
use crate::core::requirement::{DependencyRequirement, DepVersionReq};
use crate::core::variant::{VariantDef, VariantValue};
use crate::core::version::{PackageVersion, VersionPredicate};

/// Look up a built-in recipe by package name.
pub fn builtin(name: &str) -> Option<Recipe> {
    match name {
        "palace" => Some(palace()),
        _ => None,
    }
}

/// Names of all built-in recipes.
pub fn builtin_names() -> Vec<&'static str> {
    vec!["palace"]
}

/// The `palace` recipe.
pub fn palace() -> Recipe {
    PALACE.clone()
}

static PALACE: LazyLock<Recipe> = LazyLock::new(build_palace);

// Literal-parsing helpers for the static table below. The table is fixed
// data, so a malformed literal is a programming error caught at first use.

fn pv(s: &str) -> PackageVersion {
    s.parse().expect("version literal")
}

fn dv(s: &str) -> DepVersionReq {
    s.parse().expect("dependency version literal")
}

fn vp(s: &str) -> VersionPredicate {
    VersionPredicate::parse(s).expect("version predicate literal")
}

fn pred(s: &str) -> Predicate {
    Predicate::parse(s).expect("predicate literal")
}

fn pred_any(clauses: &[&str]) -> Predicate {
    Predicate::any_of(clauses).expect("predicate literal")
}

fn required_packages(items: &[&str]) -> DefineValue {
    DefineValue::List(items.iter().map(|s| s.to_string()).collect())
}

fn build_palace() -> Recipe {
    let gpu = pred_any(&["+cuda", "+rocm"]);

    Recipe::builder("palace", "3D finite element solver for computational electromagnetics")
        .homepage("https://github.com/awslabs/palace")
        .version(pv("develop"))
        .version(pv("0.13.0"))
        .version(pv("0.12.0"))
        .version(pv("0.11.2"))
        // -- Variants --
        .variant(VariantDef::boolean("shared", true, "Build shared libraries"))
        .variant(VariantDef::boolean("int64", false, "Use 64 bit integers"))
        .variant(VariantDef::boolean(
            "openmp",
            false,
            "Use OpenMP for shared-memory parallelism",
        ))
        .variant(VariantDef::boolean(
            "superlu-dist",
            true,
            "Build with SuperLU_DIST sparse direct solver",
        ))
        .variant(VariantDef::boolean(
            "strumpack",
            false,
            "Build with STRUMPACK sparse direct solver",
        ))
        .variant(VariantDef::boolean(
            "mumps",
            false,
            "Build with MUMPS sparse direct solver",
        ))
        .variant(
            VariantDef::boolean(
                "sundials",
                true,
                "Build with SUNDIALS differential/algebraic equations solver",
            )
            .only_when(vp(">=0.14")),
        )
        .variant(VariantDef::boolean(
            "slepc",
            true,
            "Build with SLEPc eigenvalue solver",
        ))
        .variant(VariantDef::boolean(
            "arpack",
            false,
            "Build with ARPACK eigenvalue solver",
        ))
        .variant(VariantDef::boolean(
            "libxsmm",
            true,
            "Build with libxsmm backend for libCEED",
        ))
        .variant(VariantDef::boolean(
            "gslib",
            true,
            "Build with GSLIB library for high-order field interpolation",
        ))
        .variant(VariantDef::boolean("cuda", false, "Build with the CUDA backend"))
        .variant(VariantDef::multi("cuda_arch", "CUDA architectures to compile for"))
        .variant(VariantDef::boolean("rocm", false, "Build with the ROCm/HIP backend"))
        .variant(VariantDef::multi(
            "amdgpu_target",
            "AMD GPU targets to compile for",
        ))
        .variant(VariantDef::choice(
            "build_type",
            ["Debug", "Release", "RelWithDebInfo"],
            "RelWithDebInfo",
            "CMake build type",
        ))
        // -- Conflicts --
        .conflict(
            pred("~superlu-dist ~strumpack ~mumps"),
            "need at least one sparse direct solver",
        )
        .conflict(
            pred("~arpack ~slepc"),
            "at least one eigenvalue solver is required",
        )
        .conflict(
            pred("+cuda +rocm"),
            "the CUDA and HIP backends cannot be combined",
        )
        .conflict(
            pred("+cuda @<0.13.0"),
            "CUDA is only supported for versions 0.13 and above",
        )
        .conflict(
            pred("+rocm @<0.13.0"),
            "ROCm is only supported for versions 0.13 and above",
        )
        .conflict(
            pred("^mumps+int64"),
            "requires MUMPS without 64 bit integers",
        )
        .conflict(
            pred("^hypre+int64"),
            "64 bit integers are supported through HYPRE's mixedint option",
        )
        // -- Core dependencies --
        .dependency(
            DependencyRequirement::new("cmake")
                .version(dv(">=3.21"))
                .build_only(),
        )
        .dependency(DependencyRequirement::new("pkgconfig").build_only())
        .dependency(DependencyRequirement::new("mpi"))
        .dependency(DependencyRequirement::new("zlib-api"))
        .dependency(DependencyRequirement::new("nlohmann-json"))
        .dependency(DependencyRequirement::new("fmt").forward("shared"))
        .dependency(DependencyRequirement::new("eigen"))
        // -- Sparse direct solvers --
        .dependency(
            DependencyRequirement::new("mumps")
                .when(pred("+mumps"))
                .pin("metis", true)
                .pin("parmetis", true)
                .forward("shared")
                .forward("openmp"),
        )
        .dependency(
            DependencyRequirement::new("superlu-dist")
                .when(pred("+superlu-dist"))
                .pin("parmetis", true)
                .forward("shared")
                .forward("int64")
                .forward("openmp")
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        .dependency(
            DependencyRequirement::new("strumpack")
                .when(pred("+strumpack"))
                .pin("butterflypack", true)
                .pin("zfp", true)
                .pin("parmetis", true)
                .forward("shared")
                .forward("openmp")
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        // -- Eigenvalue solvers --
        .dependency(
            DependencyRequirement::new("slepc")
                .when(pred("+slepc"))
                .pin("arpack", false)
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        .dependency(
            DependencyRequirement::new("petsc")
                .when(pred("+slepc"))
                .pin("mpi", true)
                .pin("double", true)
                .pin("complex", true)
                .forward("shared")
                .forward("int64")
                .forward("openmp")
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        .dependency(
            DependencyRequirement::new("arpack-ng")
                .when(pred("+arpack"))
                .version(dv("develop"))
                .pin("mpi", true)
                .pin("icb", true)
                .forward("shared"),
        )
        // -- Interpolation and assembly backends --
        .dependency(
            DependencyRequirement::new("gslib")
                .when(pred("+gslib @>=0.14"))
                .pin("mpi", true)
                .forward("shared"),
        )
        .dependency(
            DependencyRequirement::new("metis")
                .version(dv(">=5"))
                .forward("shared")
                .forward("int64"),
        )
        .dependency(
            DependencyRequirement::new("hypre")
                .pin("complex", false)
                .forward("shared")
                .forward_as("int64", "mixedint")
                .forward("openmp")
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        .dependency(
            DependencyRequirement::new("libxsmm")
                .when(pred("+libxsmm"))
                .version(dv("=main"))
                .pin_value("blas", VariantValue::Choice("0".to_string()))
                .pin("shared", true)
                .pin_when(pred("build_type=Debug"), "debug", true),
        )
        .dependency(
            DependencyRequirement::new("libceed")
                .when(pred("@>=0.14"))
                .version(dv(">=0.13"))
                .pin_when(pred("+libxsmm"), "libxsmm", true)
                .pin_when(gpu.clone(), "magma", true)
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        .dependency(
            DependencyRequirement::new("sundials")
                .when(pred("+sundials @>=0.14"))
                .forward("shared")
                .forward("openmp")
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        .dependency(
            DependencyRequirement::new("magma")
                .when(gpu.clone())
                .forward("shared")
                .forward("cuda")
                .forward("cuda_arch")
                .forward("rocm")
                .forward("amdgpu_target"),
        )
        // -- Flag table --
        .define(DefineRule::FromVariant {
            key: "CMAKE_BUILD_TYPE".into(),
            variant: "build_type".into(),
            when: Predicate::always(),
        })
        .define(from_variant("BUILD_SHARED_LIBS", "shared"))
        .define(from_variant("PALACE_WITH_64BIT_INT", "int64"))
        .define(from_variant("PALACE_WITH_ARPACK", "arpack"))
        .define(from_variant("PALACE_WITH_CUDA", "cuda"))
        .define(from_variant("PALACE_WITH_GSLIB", "gslib"))
        .define(from_variant("PALACE_WITH_HIP", "rocm"))
        .define(from_variant("PALACE_WITH_LIBXSMM", "libxsmm"))
        .define(from_variant("PALACE_WITH_MUMPS", "mumps"))
        .define(from_variant("PALACE_WITH_OPENMP", "openmp"))
        .define(from_variant("PALACE_WITH_SLEPC", "slepc"))
        .define(from_variant("PALACE_WITH_STRUMPACK", "strumpack"))
        .define(from_variant("PALACE_WITH_SUNDIALS", "sundials"))
        .define(from_variant("PALACE_WITH_SUPERLU", "superlu-dist"))
        .define(DefineRule::Set {
            key: "PALACE_BUILD_EXTERNAL_DEPS".into(),
            value: DefineValue::Bool(false),
            when: Predicate::always(),
        })
        .define(DefineRule::ArchList {
            key: "CMAKE_CUDA_ARCHITECTURES".into(),
            variant: "cuda_arch".into(),
            gate: "cuda".into(),
        })
        .define(DefineRule::ArchList {
            key: "CMAKE_HIP_ARCHITECTURES".into(),
            variant: "amdgpu_target".into(),
            gate: "rocm".into(),
        })
        // HYPRE is always built with external BLAS/LAPACK
        .define(DefineRule::Set {
            key: "HYPRE_REQUIRED_PACKAGES".into(),
            value: required_packages(&["LAPACK", "BLAS"]),
            when: Predicate::always(),
        })
        .define(DefineRule::DepLibraries {
            key: "BLAS_LIBRARIES".into(),
            package: "blas".into(),
            when: Predicate::always(),
        })
        .define(DefineRule::DepLibraries {
            key: "LAPACK_LIBRARIES".into(),
            package: "lapack".into(),
            when: Predicate::always(),
        })
        // Solver test builds link MPI explicitly
        .define(DefineRule::Set {
            key: "SuperLUDist_REQUIRED_PACKAGES".into(),
            value: required_packages(&["LAPACK", "BLAS", "MPI"]),
            when: pred("+superlu-dist"),
        })
        .define(DefineRule::Set {
            key: "SUNDIALS_REQUIRED_PACKAGES".into(),
            value: required_packages(&["LAPACK", "BLAS", "MPI"]),
            when: pred("+sundials"),
        })
        .define(DefineRule::Set {
            key: "STRUMPACK_REQUIRED_PACKAGES".into(),
            value: required_packages(&["LAPACK", "BLAS", "MPI", "MPI_Fortran"]),
            when: pred("+strumpack"),
        })
        .define(DefineRule::Set {
            key: "MUMPS_REQUIRED_PACKAGES".into(),
            value: required_packages(&["LAPACK", "BLAS", "MPI", "MPI_Fortran"]),
            when: pred("+mumps"),
        })
        // -- Dependency directories --
        // Through 0.13, libCEED and gslib are built internally and need the
        // libxsmm and magma locations passed in
        .dir_layout(DirLayout {
            when: vp("<0.14.0"),
            entries: vec![
                DirEntry {
                    key: "LIBXSMM_DIR".into(),
                    package: "libxsmm".into(),
                    when: pred("+libxsmm"),
                },
                DirEntry {
                    key: "MAGMA_DIR".into(),
                    package: "magma".into(),
                    when: gpu,
                },
            ],
        })
        // From 0.14, both are external packages with their own prefixes
        .dir_layout(DirLayout {
            when: vp(">=0.14"),
            entries: vec![
                DirEntry {
                    key: "LIBCEED_DIR".into(),
                    package: "libceed".into(),
                    when: Predicate::always(),
                },
                DirEntry {
                    key: "GSLIB_DIR".into(),
                    package: "gslib".into(),
                    when: pred("+gslib"),
                },
            ],
        })
        .build()
        .expect("built-in palace recipe is structurally valid")
}

fn from_variant(key: &str, variant: &str) -> DefineRule {
    DefineRule::FromVariant {
        key: key.into(),
        variant: variant.into(),
        when: Predicate::always(),
    }
}
