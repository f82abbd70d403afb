//! Common test utilities for loadprobe integration tests
//!
//! Wraps a temporary project directory and the compiled `loadprobe` binary so
//! CLI tests read like the commands a user would type.

// Not every suite uses every helper
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A temporary directory to run `loadprobe` in.
pub struct TestProject {
    _temp_dir: TempDir,
    project_dir: PathBuf,
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(&project_dir)?;
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// Project directory path.
    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Write `loadprobe.toml` into the project directory.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        let path = self.project_dir.join("loadprobe.toml");
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(path)
    }

    /// Files in `dir` (relative to the project), sorted.
    pub fn list_files(&self, dir: &str) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(self.project_dir.join(dir))
            .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
            .unwrap_or_default();
        files.sort();
        files
    }

    /// Run `loadprobe` in the project directory with colors and progress off.
    pub fn run_loadprobe(&self, args: &[&str]) -> Result<CommandOutput> {
        let binary = env!("CARGO_BIN_EXE_loadprobe");
        let output = Command::new(binary)
            .args(args)
            .current_dir(&self.project_dir)
            .env("NO_COLOR", "1")
            .env("LOADPROBE_NO_PROGRESS", "1")
            .env_remove("LOADPROBE_CONFIG")
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to run loadprobe command")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Captured output of one `loadprobe` invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStdout: {}\nStderr: {}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    /// Assert the command exited with `code`
    pub fn assert_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.code,
            Some(code),
            "Unexpected exit code\nStdout: {}\nStderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
