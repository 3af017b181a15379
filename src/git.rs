use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Commits the admin data files after every successful save.
///
/// A failing commit never fails the save that triggered it, so `commit`
/// reports success as a plain bool and logs the reason otherwise.
///
/// Paths may be relative to the working directory of the process; they are
/// resolved before git runs inside `repo_root`.
#[derive(Debug, Clone)]
pub struct GitCommitter {
    repo_root: PathBuf,
    paths: Vec<PathBuf>,
}

impl GitCommitter {
    pub fn new(repo_root: impl Into<PathBuf>, paths: Vec<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            paths,
        }
    }

    pub async fn commit(&self, message: &str) -> bool {
        let repo_root = match tokio::fs::canonicalize(&self.repo_root).await {
            Ok(root) => root,
            Err(e) => {
                warn!("git: repository {} not usable: {}", self.repo_root.display(), e);
                return false;
            }
        };

        let mut existing = Vec::new();
        for path in &self.paths {
            if let Some(resolved) = resolve(path).await {
                existing.push(resolved);
            }
        }
        if existing.is_empty() {
            debug!("git: no tracked admin files exist yet, skipping commit");
            return false;
        }

        let mut add = Command::new("git");
        add.arg("add").arg("--").args(&existing).current_dir(&repo_root);
        if let Err(e) = run(add).await {
            warn!("git add failed: {}", e);
            return false;
        }

        let mut commit = Command::new("git");
        commit.args(["commit", "-m", message]).current_dir(&repo_root);
        match run(commit).await {
            Ok(_) => {
                info!("git: committed '{}'", message);
                true
            }
            Err(output) if output.to_lowercase().contains("nothing to commit") => {
                debug!("git: nothing to commit");
                true
            }
            Err(e) => {
                warn!("git commit failed: {}", e);
                false
            }
        }
    }
}

/// Absolute form of an existing file, `None` when it is missing.
async fn resolve(path: &Path) -> Option<PathBuf> {
    tokio::fs::canonicalize(path).await.ok()
}

/// Runs a git command; `Err` carries stdout + stderr of a failed run.
///
/// The child is killed when the timeout drops it, so a hung git never keeps
/// `.git/index.lock` around for the next save.
async fn run(command: Command) -> Result<String, String> {
    run_with_timeout(command, GIT_TIMEOUT).await
}

async fn run_with_timeout(mut command: Command, limit: Duration) -> Result<String, String> {
    command.kill_on_drop(true);
    let output = timeout(limit, command.output())
        .await
        .map_err(|_| "timed out".to_string())?
        .map_err(|e| e.to_string())?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if output.status.success() {
        Ok(stdout)
    } else {
        Err(format!("{}{}", stdout, String::from_utf8_lossy(&output.stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_outside_repository_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("recipes.json");
        std::fs::write(&file, "[]").unwrap();

        let git = GitCommitter::new(dir.path(), vec![file]);
        assert!(!git.commit("Admin: test").await);
    }

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    fn init_repo(dir: &Path) {
        git(dir, &["init", "--quiet"]);
        git(dir, &["config", "user.email", "admin@example.org"]);
        git(dir, &["config", "user.name", "Admin"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
    }

    #[tokio::test]
    async fn test_commit_with_relative_admin_and_site_dirs() {
        // Relative to the test's working directory, like ADMIN_DIR/SITE_ROOT
        // defaults are relative to wherever the binary is started.
        let dir = tempfile::tempdir_in(".").unwrap();
        let site = PathBuf::from(".").join(dir.path().file_name().unwrap());
        let admin = site.join("admin");
        std::fs::create_dir_all(&admin).unwrap();
        init_repo(&site);
        std::fs::write(admin.join("recipes.json"), "[]").unwrap();

        let mut config = crate::config::AdminConfig::new(&admin, &site);
        config.git_auto_commit = true;
        let committer = config.git_committer().unwrap();

        assert!(committer.commit("Admin: Rezepte aktualisiert (0 Rezepte)").await);
        let log = git(&site, &["log", "--format=%s"]);
        assert_eq!(log.trim(), "Admin: Rezepte aktualisiert (0 Rezepte)");
        let files = git(&site, &["show", "--name-only", "--format="]);
        assert_eq!(files.trim(), "admin/recipes.json");

        // unchanged files count as success
        assert!(committer.commit("Admin: again").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_command_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");

        let mut slow = Command::new("sh");
        slow.arg("-c").arg(format!("sleep 1; touch '{}'", marker.display()));
        let result = run_with_timeout(slow, Duration::from_millis(100)).await;
        assert_eq!(result, Err("timed out".to_string()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_commit_without_files_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCommitter::new(dir.path(), vec![dir.path().join("missing.json")]);
        assert!(!git.commit("Admin: test").await);
    }
}
