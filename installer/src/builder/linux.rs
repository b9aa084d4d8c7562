//! Linux static build plan.
//!
//! Only engaged when static linking has been requested. Symbols are built
//! hidden so the static copy cannot collide with a different OpenSSL that a
//! dynamically loaded system library brings into the same process.

use super::{BuildDirs, STATIC_FLAGS};
use crate::error::{AcquireError, Result};
use crate::platform::Arch;

const HIDDEN_VISIBILITY_FLAG: &str = "-fvisibility=hidden";

/// A validated Linux build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxBuild {
    arch: Arch,
    configure_target: &'static str,
}

impl LinuxBuild {
    /// Pick the configure target for `arch`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::UnsupportedConfiguration`] when the
    /// architecture is unknown.
    pub fn resolve(arch: Option<Arch>) -> Result<Self> {
        let Some(arch) = arch else {
            return Err(AcquireError::unsupported(
                "no Linux configure target for this architecture",
            ));
        };
        let configure_target = match arch {
            Arch::X64 => "linux-x86_64",
            Arch::Arm64 => "linux-aarch64",
            Arch::X86 => "linux-x86",
        };
        Ok(Self {
            arch,
            configure_target,
        })
    }

    /// The architecture being built.
    #[must_use]
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// The OpenSSL configure target.
    #[must_use]
    pub fn configure_target(&self) -> &str {
        self.configure_target
    }

    /// Arguments following `./Configure`.
    #[must_use]
    pub fn configure_args(&self, dirs: &BuildDirs<'_>) -> Vec<String> {
        let mut args = vec![self.configure_target.to_owned()];
        args.extend(STATIC_FLAGS.iter().map(|f| (*f).to_owned()));
        args.push(HIDDEN_VISIBILITY_FLAG.to_owned());
        args.extend(dirs.prefix_args());
        args
    }
}
