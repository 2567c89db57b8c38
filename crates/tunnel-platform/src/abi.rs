use log::debug;

/// ABI name the host reports, using the naming scheme of the bundled
/// binaries (`armeabi-v7a`, `arm64-v8a`, `x86`, ...).
///
/// The value is reported as-is; deciding whether a binary exists for it is
/// left to the installer.
#[must_use]
pub fn host_abi() -> String {
    let abi = abi_for_arch(std::env::consts::ARCH);
    debug!(
        "Host architecture {} reported as ABI {abi}",
        std::env::consts::ARCH
    );
    abi
}

fn abi_for_arch(arch: &str) -> String {
    match arch {
        "arm" => "armeabi-v7a",
        "aarch64" => "arm64-v8a",
        "x86" => "x86",
        "x86_64" => "x86_64",
        "mips" => "mips",
        "mips64" => "mips64",
        other => other,
    }
    .to_string()
}
