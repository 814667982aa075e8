use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub home: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("solc-select");
        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_solc-select"));

        Self {
            _temp_dir: temp_dir,
            home,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("SOLC_SELECT_HOME", &self.home);
        cmd.env_remove("SOLC_VERSION");
        cmd.env_remove("RUST_LOG");
        // Nothing should reach the real binaries host unless a test asks for it
        cmd.env("SOLC_SELECT_BINARIES_URL", "http://127.0.0.1:9");
        cmd.env("SOLC_SELECT_LEGACY_LIST_URL", "http://127.0.0.1:9/list.json");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run solc-select")
            .into()
    }

    /// Like [`TestContext::run`] but against the real binaries host.
    pub fn run_live(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .env_remove("SOLC_SELECT_BINARIES_URL")
            .env_remove("SOLC_SELECT_LEGACY_LIST_URL")
            .args(args)
            .output()
            .expect("Failed to run solc-select")
            .into()
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.home.join("artifacts")
    }

    pub fn marker(&self) -> PathBuf {
        self.home.join("global-version")
    }

    /// Pretend `version` is installed with a shell script standing in for solc.
    pub fn fake_install(&self, version: &str) -> PathBuf {
        let dir = self.artifacts_dir().join(format!("solc-{}", version));
        fs::create_dir_all(&dir).expect("Failed to create version dir");
        let exe = dir.join(format!("solc-{}", version));
        fs::write(
            &exe,
            format!("#!/bin/sh\necho \"fake solc {}\"\necho \"args: $*\"\n", version),
        )
        .expect("Failed to write fake solc");
        make_executable(&exe);
        exe
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to set permissions");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
