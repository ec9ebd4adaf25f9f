use crate::error::DownloaderError;
use crate::types::ToolLocation;
use log::debug;
use std::path::{Path, PathBuf};

pub trait ToolLocator: Send + Sync {
    fn locate(&self) -> Result<ToolLocation, DownloaderError>;
}

/// Name of the yt-dlp build shipped in a `bin/` directory for this platform.
pub fn bundled_binary_name() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("yt-dlp_macos")
    } else if cfg!(target_os = "linux") {
        Some("yt-dlp_linux")
    } else if cfg!(target_os = "windows") {
        Some("yt-dlp.exe")
    } else {
        None
    }
}

/// Resolves yt-dlp, trying in order: an explicit path, a `bin/` directory next to
/// the running executable, the project root's `bin/` (development layout), and
/// finally `yt-dlp` on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct YtDlpLocator {
    explicit: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
}

impl YtDlpLocator {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self { explicit, exe_dir }
    }

    fn bundled_candidates(&self) -> Vec<PathBuf> {
        let (Some(exe_dir), Some(name)) = (&self.exe_dir, bundled_binary_name()) else {
            return Vec::new();
        };
        let mut candidates = vec![exe_dir.join("bin").join(name)];
        // target/<profile>/ -> project root
        if let Some(root) = exe_dir.parent().and_then(Path::parent) {
            candidates.push(root.join("bin").join(name));
        }
        candidates
    }
}

impl ToolLocator for YtDlpLocator {
    fn locate(&self) -> Result<ToolLocation, DownloaderError> {
        if let Some(path) = &self.explicit {
            if path.is_file() {
                return Ok(ToolLocation {
                    binary: path.clone(),
                    aux_dir: None,
                });
            }
            return Err(DownloaderError::ToolNotFound(format!(
                "{} does not exist",
                path.display()
            )));
        }

        for candidate in self.bundled_candidates() {
            debug!("Looking for bundled yt-dlp at {}", candidate.display());
            if candidate.is_file() {
                let aux_dir = candidate.parent().map(Path::to_path_buf);
                return Ok(ToolLocation {
                    binary: candidate,
                    aux_dir,
                });
            }
        }

        which::which("yt-dlp")
            .map(|binary| ToolLocation {
                binary,
                aux_dir: None,
            })
            .map_err(|e| DownloaderError::ToolNotFound(format!("yt-dlp not found in bin/ or PATH: {}", e)))
    }
}
