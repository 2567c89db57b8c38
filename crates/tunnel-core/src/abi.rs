use log::warn;

/// Pick the ABI whose binary should be installed.
///
/// Returns `reported` when it is in `supported`, otherwise `fallback`. An
/// unsupported ABI only produces a warning; installation goes ahead with the
/// fallback binary.
#[must_use]
pub fn select_abi<'a, S: AsRef<str>>(
    reported: &'a str,
    supported: &[S],
    fallback: &'a str,
) -> &'a str {
    if supported.iter().any(|abi| abi.as_ref() == reported) {
        return reported;
    }

    warn!("ABI {reported} is not supported. Installing {fallback} binary");
    fallback
}

/// Asset lookup key for `binary` built for `abi`.
#[must_use]
pub fn asset_key(abi: &str, binary: &str) -> String {
    format!("{abi}/{binary}.bin")
}

#[cfg(test)]
mod tests {
    use super::{asset_key, select_abi};
    use crate::config::DEFAULT_SUPPORTED_ABIS;

    #[test]
    fn supported_abis_are_returned_unchanged() {
        for abi in DEFAULT_SUPPORTED_ABIS {
            assert_eq!(select_abi(abi, &DEFAULT_SUPPORTED_ABIS, "armeabi"), abi);
        }
    }

    #[test]
    fn unsupported_abis_fall_back() {
        for abi in ["arm64-v8a", "x86_64", "", "ARMEABI", "riscv64"] {
            assert_eq!(
                select_abi(abi, &DEFAULT_SUPPORTED_ABIS, "armeabi"),
                "armeabi"
            );
        }
    }

    #[test]
    fn selection_accepts_owned_strings() {
        let supported = vec!["x86".to_string()];

        assert_eq!(select_abi("x86", &supported, "armeabi"), "x86");
        assert_eq!(select_abi("mips", &supported, "armeabi"), "armeabi");
    }

    #[test]
    fn asset_key_joins_abi_and_binary() {
        assert_eq!(asset_key("armeabi-v7a", "iodine"), "armeabi-v7a/iodine.bin");
    }
}
