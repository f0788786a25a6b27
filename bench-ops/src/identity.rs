//! Process identity: ownership fixups and privilege drop.
//!
//! # Invariant
//!
//! [`drop_privileges`] always sets the group identity before the user
//! identity. Once the uid is no longer root the process can no longer change
//! its gid, so the reverse order leaves it running with root's group.

use std::path::{Path, PathBuf};

use bench_core::{config, BenchError};
use nix::unistd::{Gid, Group, Uid, User};

use crate::error::OpsError;

/// Umask applied after dropping privileges: owner-only access.
pub const DROPPED_UMASK: u32 = 0o077;

/// Bench-relative files whose ownership `fix_file_perms` repairs.
pub const OWNED_FILES: [&str; 8] = [
    "logs/web.error.log",
    "logs/web.log",
    "logs/workerbeat.error.log",
    "logs/workerbeat.log",
    "logs/worker.error.log",
    "logs/worker.log",
    "config/nginx.conf",
    "config/supervisor.conf",
];

/// OS identity operations, split out so ordering can be asserted in tests.
pub trait Identity {
    fn is_privileged(&self) -> bool;
    /// Login name of the invoking user.
    fn current_user(&self) -> Option<String>;
    fn user_id(&self, name: &str) -> Result<u32, OpsError>;
    fn group_id(&self, name: &str) -> Result<u32, OpsError>;
    fn clear_groups(&self) -> Result<(), OpsError>;
    fn set_gid(&self, gid: u32) -> Result<(), OpsError>;
    fn set_uid(&self, uid: u32) -> Result<(), OpsError>;
    /// Returns the previous mask.
    fn set_umask(&self, mask: u32) -> u32;
    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<(), OpsError>;
}

// ---------------------------------------------------------------------------
// SystemIdentity
// ---------------------------------------------------------------------------

/// The real thing, via `nix::unistd`.
#[derive(Debug, Clone, Default)]
pub struct SystemIdentity;

impl Identity for SystemIdentity {
    fn is_privileged(&self) -> bool {
        Uid::current().is_root()
    }

    fn current_user(&self) -> Option<String> {
        for var in ["LOGNAME", "USER", "LNAME", "USERNAME"] {
            if let Ok(name) = std::env::var(var) {
                if !name.is_empty() {
                    return Some(name);
                }
            }
        }
        User::from_uid(Uid::current())
            .ok()
            .flatten()
            .map(|u| u.name)
    }

    fn user_id(&self, name: &str) -> Result<u32, OpsError> {
        User::from_name(name)
            .map_err(|source| OpsError::Identity {
                op: "getpwnam",
                source,
            })?
            .map(|u| u.uid.as_raw())
            .ok_or_else(|| OpsError::UnknownUser {
                name: name.to_string(),
            })
    }

    fn group_id(&self, name: &str) -> Result<u32, OpsError> {
        Group::from_name(name)
            .map_err(|source| OpsError::Identity {
                op: "getgrnam",
                source,
            })?
            .map(|g| g.gid.as_raw())
            .ok_or_else(|| OpsError::UnknownGroup {
                name: name.to_string(),
            })
    }

    #[cfg(not(target_vendor = "apple"))]
    fn clear_groups(&self) -> Result<(), OpsError> {
        nix::unistd::setgroups(&[]).map_err(|source| OpsError::Identity {
            op: "setgroups",
            source,
        })
    }

    // setgroups is not exposed for Apple targets; supplementary groups are
    // left to setgid/setuid there.
    #[cfg(target_vendor = "apple")]
    fn clear_groups(&self) -> Result<(), OpsError> {
        Ok(())
    }

    fn set_gid(&self, gid: u32) -> Result<(), OpsError> {
        nix::unistd::setgid(Gid::from_raw(gid)).map_err(|source| OpsError::Identity {
            op: "setgid",
            source,
        })
    }

    fn set_uid(&self, uid: u32) -> Result<(), OpsError> {
        nix::unistd::setuid(Uid::from_raw(uid)).map_err(|source| OpsError::Identity {
            op: "setuid",
            source,
        })
    }

    fn set_umask(&self, mask: u32) -> u32 {
        use nix::sys::stat::{umask, Mode};
        let old = umask(Mode::from_bits_truncate(mask as nix::libc::mode_t));
        old.bits() as u32
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<(), OpsError> {
        nix::unistd::chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid))).map_err(
            |source| OpsError::Identity {
                op: "chown",
                source,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn is_root<I: Identity + ?Sized>(identity: &I) -> bool {
    identity.is_privileged()
}

/// Become `user:group` for good. No-op when not privileged.
///
/// Order: resolve both names, clear supplementary groups, set gid, set uid,
/// tighten umask. Nothing is changed if either name fails to resolve.
pub fn drop_privileges<I: Identity + ?Sized>(
    identity: &I,
    user: &str,
    group: &str,
) -> Result<(), OpsError> {
    if !identity.is_privileged() {
        tracing::debug!("not running as root; keeping current identity");
        return Ok(());
    }

    let uid = identity.user_id(user)?;
    let gid = identity.group_id(group)?;

    identity.clear_groups()?;
    identity.set_gid(gid)?;
    identity.set_uid(uid)?;
    identity.set_umask(DROPPED_UMASK);

    tracing::info!("dropped privileges to {user}:{group}");
    Ok(())
}

/// As root, become the bench's `frappe_user` (and the group of the same
/// name). Returns the user switched to.
///
/// Config errors propagate: an unreadable or corrupt `config.json` must not
/// leave the process running as root. Only an unset `frappe_user` keeps the
/// current identity, with a warning.
pub fn drop_to_bench_user<I: Identity + ?Sized>(
    identity: &I,
    bench: &Path,
) -> Result<Option<String>, OpsError> {
    if !identity.is_privileged() {
        return Ok(None);
    }
    let user = config::load_bench_config(bench)?
        .frappe_user
        .filter(|u| !u.is_empty());
    let Some(user) = user else {
        tracing::warn!("frappe_user is not set in config.json; continuing as root");
        return Ok(None);
    };
    drop_privileges(identity, &user, &user)?;
    Ok(Some(user))
}

/// Resolve the owning user: explicit argument first, then `frappe_user`
/// from `config.json`.
pub fn resolve_owning_user(bench: &Path, explicit: Option<&str>) -> Result<String, OpsError> {
    if let Some(user) = explicit.filter(|u| !u.is_empty()) {
        return Ok(user.to_string());
    }
    config::load_bench_config(bench)?
        .frappe_user
        .filter(|u| !u.is_empty())
        .ok_or(OpsError::Bench(BenchError::UserNotConfigured))
}

/// Chown every existing file of [`OWNED_FILES`] to the owning user and the
/// group of the same name. Returns the paths changed.
pub fn fix_file_perms<I: Identity + ?Sized>(
    identity: &I,
    bench: &Path,
    user: Option<&str>,
) -> Result<Vec<PathBuf>, OpsError> {
    let user = resolve_owning_user(bench, user)?;

    let mut changed = Vec::new();
    for rel in OWNED_FILES {
        let path = bench.join(rel);
        if !path.exists() {
            continue;
        }
        let uid = identity.user_id(&user)?;
        let gid = identity.group_id(&user)?;
        identity.chown(&path, uid, gid)?;
        tracing::info!("chown {user}:{user} {}", path.display());
        changed.push(path);
    }
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
