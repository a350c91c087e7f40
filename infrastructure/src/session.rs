//! Session directory management.

use std::path::Path;

use chrono::Local;
use conclave_domain::{session_dir_name, SessionLayout, LIVE_SESSION};
use tracing::info;

/// Create (or reuse, when resuming) a session directory under `root`.
///
/// Fresh sessions get a timestamped name; `resume` reuses the `live`
/// directory so a previous discussion can continue. Permissions restrict
/// the directory to the owning user.
pub fn create_session_dir(root: &Path, resume: bool) -> std::io::Result<SessionLayout> {
    let name = if resume {
        LIVE_SESSION.to_string()
    } else {
        session_dir_name(Local::now())
    };
    let dir = root.join(name);
    std::fs::create_dir_all(&dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))?;
    }
    info!(session = %dir.display(), "session directory ready");
    Ok(SessionLayout::new(dir))
}
