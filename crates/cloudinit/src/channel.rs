//! Kubernetes version parsing and snap channel resolution.
//!
//! The snap channel for an installation is derived from the kubernetes
//! version (major.minor), the confinement mode and an optional risk level.
//! `install_argument` is a pure function: identical inputs always produce
//! the identical argument string, which the golden-output tests rely on.

use crate::error::Error;

/// Snap confinement mode for the snapk8s installation.
///
/// Strict confinement is only published for kubernetes 1.25 and newer;
/// the plan compiler rejects earlier versions before any channel argument
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confinement {
    /// Classic confinement (the default)
    #[default]
    Classic,
    /// Strict confinement
    Strict,
}

impl Confinement {
    /// Parses the confinement mode from its API string representation.
    ///
    /// Only `"strict"` selects strict confinement; anything else (including
    /// the empty string) falls back to classic, matching the API default.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s == "strict" {
            Confinement::Strict
        } else {
            Confinement::Classic
        }
    }
}

/// Extracts the (major, minor) parts from a semantic version string.
///
/// Accepts an optional leading `v` and an optional pre-release or build
/// suffix (`v1.25.2-rc.1`, `1.26.0+build`). Fails with
/// [`Error::InvalidVersion`] when no numeric major.minor pair can be
/// recognized.
pub fn parse_version(version: &str) -> Result<(u64, u64), Error> {
    let stripped = version.trim().trim_start_matches('v');
    let core = stripped
        .split(['-', '+'])
        .next()
        .unwrap_or(stripped);

    let mut segments = core.split('.');
    let major = segments.next().and_then(|s| s.parse::<u64>().ok());
    let minor = segments.next().and_then(|s| s.parse::<u64>().ok());

    match (major, minor) {
        (Some(major), Some(minor)) => Ok((major, minor)),
        _ => Err(Error::InvalidVersion(version.to_string())),
    }
}

/// Rejects confinement/version combinations that have no published snap.
pub(crate) fn check_confinement(
    confinement: Confinement,
    major: u64,
    minor: u64,
) -> Result<(), Error> {
    if confinement == Confinement::Strict && minor < 25 {
        return Err(Error::UnsupportedConfinement { major, minor });
    }
    Ok(())
}

/// Builds the argument string passed to the install script.
///
/// The channel is `{major}.{minor}`, suffixed with `-strict` for strict
/// confinement and `/{risk_level}` when a risk level is given. Classic
/// confinement additionally needs the `--classic` flag.
#[must_use]
pub fn install_argument(
    confinement: Confinement,
    risk_level: &str,
    major: u64,
    minor: u64,
) -> String {
    let mut channel = format!("{major}.{minor}");
    if confinement == Confinement::Strict {
        channel.push_str("-strict");
    }
    if !risk_level.is_empty() {
        channel.push('/');
        channel.push_str(risk_level);
    }

    let mut argument = format!("--channel {channel}");
    if confinement != Confinement::Strict {
        argument.push_str(" --classic");
    }
    argument
}
