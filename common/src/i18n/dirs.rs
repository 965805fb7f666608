//! Platform directory lookup behind a mockable trait.

use camino::Utf8PathBuf;
use directories_next::ProjectDirs;

/// Source of per-user directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Per-user configuration directory for Nayi Manzil, if the platform has
    /// one and its path is valid UTF-8.
    fn manzil_config_dir(&self) -> Option<Utf8PathBuf>;
}

/// [`BaseDirs`] backed by the operating system's conventions.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn manzil_config_dir(&self) -> Option<Utf8PathBuf> {
        ProjectDirs::from("org", "Nayi Manzil", "nayi-manzil")
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok())
    }
}
