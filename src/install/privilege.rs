//! Dropping sudo privileges before installing into a virtualenv
//!
//! A virtualenv exists so packages land in a user-owned location. When the
//! installer was started through sudo, the effective ids are switched back to
//! the invoking user (`SUDO_UID` / `SUDO_GID`) before anything is written
//! into the environment.

use crate::error::Result;
use crate::logging::Logger;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// Switch effective uid/gid to the sudo caller when running as root
        pub fn drop_root_privileges(logger: &Logger) -> Result<()> {
            use nix::unistd::{Gid, Uid, geteuid, setegid, seteuid};

            if !geteuid().is_root() {
                return Ok(());
            }

            logger.info("Dropping root permissions...");
            // Group first: once the uid is dropped we may no longer change it.
            setegid(Gid::from_raw(sudo_id("SUDO_GID"))).map_err(std::io::Error::from)?;
            seteuid(Uid::from_raw(sudo_id("SUDO_UID"))).map_err(std::io::Error::from)?;
            Ok(())
        }
    } else {
        pub fn drop_root_privileges(_logger: &Logger) -> Result<()> {
            Ok(())
        }
    }
}

/// Numeric id from a sudo environment variable, root when unset or invalid
#[cfg_attr(not(unix), allow(dead_code))]
fn sudo_id(var: &str) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}
