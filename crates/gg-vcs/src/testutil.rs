use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Throwaway repository driven through the git CLI.
pub struct GitTestRepo {
    dir: TempDir,
}

impl GitTestRepo {
    pub fn new() -> std::io::Result<Self> {
        let repo = Self {
            dir: TempDir::new()?,
        };
        repo.git(&["init", "--quiet", "--initial-branch=main"])?;
        repo.git(&["config", "user.name", "Test User"])?;
        repo.git(&["config", "user.email", "test@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self, args: &[&str]) -> std::io::Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("HOME", self.path())
            .output()?;
        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "git {args:?} failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Records an empty commit and returns its full hash.
    pub fn commit(&self, message: &str) -> std::io::Result<String> {
        self.git(&["commit", "--quiet", "--allow-empty", "-m", message])?;
        self.git(&["rev-parse", "HEAD"])
    }
}
