// Shared memory location per platform
//
// Linux: /dev/shm/whill (tmpfs, RAM-backed)
// Elsewhere, or when /dev/shm is missing: <temp dir>/whill
// WHILL_SHM_DIR overrides both.

use std::path::PathBuf;

/// Environment variable that relocates every shared memory file
pub const SHM_DIR_ENV: &str = "WHILL_SHM_DIR";

/// Base directory for WHILL shared memory
pub fn shm_base_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(SHM_DIR_ENV) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "linux")]
    {
        if std::path::Path::new("/dev/shm").is_dir() {
            return PathBuf::from("/dev/shm/whill");
        }
    }

    std::env::temp_dir().join("whill")
}

/// Directory holding one file per shared topic
pub fn shm_topics_dir() -> PathBuf {
    shm_base_dir().join("topics")
}

/// File name for a topic; path separators and colons become underscores
pub fn topic_file_name(topic_name: &str) -> String {
    format!("whill_{}", topic_name.replace(['/', ':', '\\'], "_"))
}
