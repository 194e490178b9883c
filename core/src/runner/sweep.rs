use std::path::Path;

use sysinfo::System;

/// Kill every host process whose executable name matches `bin`.
///
/// Untargeted: processes started by anyone are affected. Returns how many
/// kill signals were delivered; zero when nothing matched.
pub fn kill_by_name(bin: &str) -> usize {
    let Some(name) = Path::new(bin)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
    else {
        return 0;
    };
    let exe_name = format!("{name}.exe");

    let mut sys = System::new();
    sys.refresh_processes();

    let mut killed = 0;
    for process in sys.processes().values() {
        let pname = process.name();
        if pname == name || pname.eq_ignore_ascii_case(&exe_name) {
            if process.kill() {
                tracing::info!(pid = %process.pid(), name = %pname, "encoder killed by name");
                killed += 1;
            } else {
                tracing::warn!(pid = %process.pid(), name = %pname, "kill by name failed");
            }
        }
    }
    killed
}
