//! Build definitions: the translator's output.

use std::fmt;

use serde::Serialize;

use crate::core::define::DefineValue;

/// One build-tool definition, rendered as `-DKEY=value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDefine {
    pub key: String,
    pub value: DefineValue,
}

impl BuildDefine {
    /// Create a definition.
    pub fn new(key: impl Into<String>, value: impl Into<DefineValue>) -> Self {
        BuildDefine {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Render as a CMake command-line argument.
    pub fn to_arg(&self) -> String {
        format!("-D{}={}", self.key, self.value.render())
    }
}

impl fmt::Display for BuildDefine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_arg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bool_define() {
        let define = BuildDefine::new("BUILD_SHARED_LIBS", true);
        assert_eq!(define.to_arg(), "-DBUILD_SHARED_LIBS=ON");
    }

    #[test]
    fn test_render_list_define() {
        let define = BuildDefine::new(
            "BLAS_LIBRARIES",
            DefineValue::List(vec!["libopenblas.so".into()]),
        );
        assert_eq!(define.to_arg(), "-DBLAS_LIBRARIES=libopenblas.so");
    }
}
