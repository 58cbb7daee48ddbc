use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// audioconf application settings tree
///
/// Where the console finds the persisted environment and the flag
/// files it raises for the system services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Shell envars file holding the audio configuration
    pub env_file: PathBuf,
    /// Touched when a change needs a system update before it works
    pub update_sys_flag: PathBuf,
    /// Touched when the saved configuration needs a reboot
    pub reboot_flag: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from("/zynthian/config/zynthian_envars.sh"),
            update_sys_flag: PathBuf::from("/zynthian/config/zynthian_update_sys"),
            reboot_flag: PathBuf::from("/zynthian/config/zynthian_reboot"),
        }
    }
}
