//! Dotted version comparison for the self-updater.

/// Splits `"1.2.3"` into its numeric components. Any non-numeric component
/// makes the whole string invalid.
pub fn parse_components(version: &str) -> Option<Vec<u64>> {
    version
        .trim()
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Returns true only if `remote` is strictly newer than `local`.
///
/// Shorter versions are padded with zeros, so `"1.0"` equals `"1.0.0"`.
/// Malformed input on either side yields false rather than an error, so a
/// broken manifest never forces an update.
pub fn is_newer(remote: &str, local: &str) -> bool {
    let (Some(mut remote), Some(mut local)) = (parse_components(remote), parse_components(local))
    else {
        tracing::warn!("Cannot compare versions {:?} and {:?}", remote, local);
        return false;
    };

    let len = remote.len().max(local.len());
    remote.resize(len, 0);
    local.resize(len, 0);

    remote > local
}
