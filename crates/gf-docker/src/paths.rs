//! Host-path translation for the container runtime.

use tracing::debug;

/// Mount root under which the desktop container runtime exposes host
/// drives.
pub const HOST_MOUNT_ROOT: &str = "/run/desktop/mnt/host";

/// Rewrite a drive-letter host path into the runtime's mount convention,
/// e.g. `C:\Users\me\workspace` becomes
/// `/run/desktop/mnt/host/c/Users/me/workspace`. Paths without a drive
/// prefix are returned unchanged.
pub fn format_host_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let has_drive_prefix =
        bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\';
    if !has_drive_prefix {
        return path.to_owned();
    }

    let drive = bytes[0].to_ascii_lowercase() as char;
    let rest = path[3..].replace('\\', "/");
    let translated = if rest.is_empty() {
        format!("{HOST_MOUNT_ROOT}/{drive}")
    } else {
        format!("{HOST_MOUNT_ROOT}/{drive}/{rest}")
    };
    debug!(from = path, to = %translated, "translated host path for container runtime");
    translated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_paths_are_rewritten() {
        assert_eq!(
            format_host_path("C:\\Users\\me\\workspace"),
            "/run/desktop/mnt/host/c/Users/me/workspace"
        );
    }

    #[test]
    fn bare_drive_maps_to_mount_root() {
        assert_eq!(format_host_path("D:\\"), "/run/desktop/mnt/host/d");
    }

    #[test]
    fn unix_paths_pass_through() {
        assert_eq!(format_host_path("/srv/workspace"), "/srv/workspace");
    }
}
