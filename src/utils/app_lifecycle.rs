use std::path::{Path, PathBuf};
use std::process::Command;

use crate::utils::{AppError, AppResult};

/// Process-level actions the orchestrator can take on the host application.
pub trait AppLifecycle: Send + Sync {
    /// Start a fresh instance of the host application.
    fn relaunch(&self) -> AppResult<()>;

    /// Terminate the current instance.
    fn exit(&self);
}

/// Real lifecycle backed by `open` and `std::process::exit`.
pub struct SystemLifecycle;

/// Resolve the enclosing `.app` bundle of an executable at
/// `.app/Contents/MacOS/<binary>`.
pub fn app_bundle_of(exe: &Path) -> Option<PathBuf> {
    let bundle = exe
        .parent() // MacOS/
        .and_then(|p| p.parent()) // Contents/
        .and_then(|p| p.parent())?; // .app/
    let is_bundle = bundle
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("app"));
    is_bundle.then(|| bundle.to_path_buf())
}

impl AppLifecycle for SystemLifecycle {
    fn relaunch(&self) -> AppResult<()> {
        let exe = std::env::current_exe()
            .map_err(|e| AppError::CommandFailed(format!("Failed to find current executable: {}", e)))?;

        match app_bundle_of(&exe) {
            Some(bundle) => {
                log::info!("Relaunching bundle {}", bundle.display());
                // -n starts a second instance even though this one is still alive.
                Command::new("open")
                    .current_dir("/tmp")
                    .arg("-n")
                    .arg(&bundle)
                    .spawn()
                    .map_err(|e| AppError::CommandFailed(format!("open -n: {}", e)))?;
            }
            None => {
                log::info!("Relaunching executable {}", exe.display());
                Command::new(&exe)
                    .args(std::env::args_os().skip(1))
                    .spawn()
                    .map_err(|e| AppError::CommandFailed(format!("relaunch: {}", e)))?;
            }
        }
        Ok(())
    }

    fn exit(&self) {
        log::info!("Exiting application");
        std::process::exit(0);
    }
}
