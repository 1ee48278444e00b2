use std::path::{Path, PathBuf};

pub const STATE_DIR: &str = ".persona";
pub const STATE_FILE: &str = "session.json";

#[must_use]
pub fn state_root(home: &Path) -> PathBuf {
    home.join(STATE_DIR)
}

#[must_use]
pub fn state_file(home: &Path) -> PathBuf {
    state_root(home).join(STATE_FILE)
}
