//! RFC 952 host label helpers

/// Longest host label handed to the network interface.
pub const RFC952_HOSTNAME_MAXLEN: usize = 24;

/// Reduce an arbitrary device identifier to a host label.
///
/// Only ASCII letters, digits and `-` survive, at most
/// [`RFC952_HOSTNAME_MAXLEN`] characters of the input are considered, and the
/// label never ends with `-`. An empty candidate yields an empty label; use
/// [`fallback_hostname`] before calling in that case.
pub fn rfc952_hostname(candidate: &str) -> String {
    let mut label: String = candidate
        .chars()
        .take(RFC952_HOSTNAME_MAXLEN)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    // no '-' as last char
    while label.ends_with('-') {
        label.pop();
    }

    label
}

/// Hostname used when the application does not supply one, `ESP32-<CHIPID>`.
pub fn fallback_hostname(chip_id: u32) -> String {
    format!("ESP32-{:X}", chip_id)
}

/// Sanitize `candidate`, falling back to the chip-id name when nothing usable is left.
pub fn derive_hostname(candidate: &str, chip_id: u32) -> String {
    let label = rfc952_hostname(candidate);
    if label.is_empty() {
        rfc952_hostname(&fallback_hostname(chip_id))
    } else {
        label
    }
}
