#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SCHEMA: &str = "
CREATE TABLE items (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    embedding VECTOR(3) NOT NULL,
    signature BIT(8)
);
";

/// Isolated scratch directory holding SQL files for CLI runs
pub struct SqlDir {
    dir: PathBuf,
}

impl SqlDir {
    pub fn new() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        let dir = std::env::temp_dir().join(format!("vchord-test-{}", now.as_nanos()));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        SqlDir { dir }
    }

    pub fn write(&self, name: &str, sql: &str) -> PathBuf {
        let path = self.dir.join(name);
        fs::write(&path, sql).expect("failed to write SQL file");
        path
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for SqlDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// Run the `vchord` binary
pub fn vchord(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vchord"))
        .args(args)
        .env_remove("VCHORD_MODULES")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run vchord")
}
