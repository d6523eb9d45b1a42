//! Shared test helpers for patchline integration tests.
//!
//! Every test builds its own fixture in a temp directory: a working repo on
//! `main`, a bare `origin`, and frontend/backend patch directories.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A scratch layout for one replay.
pub struct Fixture {
    pub root: TempDir,
}

impl Fixture {
    /// Working repo with one commit (`hello.txt`), pushed to a bare remote,
    /// plus empty `frontend/` and `backend/` patch directories.
    pub fn new() -> Self {
        let root = TempDir::new().expect("failed to create temp dir");
        let fixture = Self { root };

        git(fixture.root.path(), &["init", "--bare", "--initial-branch=main", "remote.git"]);

        let work = fixture.work();
        std::fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "--initial-branch=main"]);
        git(&work, &["config", "user.name", "Test User"]);
        git(&work, &["config", "user.email", "test@test.com"]);
        git(&work, &["config", "commit.gpgsign", "false"]);
        std::fs::write(work.join("hello.txt"), "hello\n").unwrap();
        git(&work, &["add", "hello.txt"]);
        git(&work, &["commit", "-m", "initial commit"]);
        let remote = fixture.remote().display().to_string();
        git(&work, &["remote", "add", "origin", &remote]);
        git(&work, &["push", "origin", "main"]);

        std::fs::create_dir_all(fixture.frontend()).unwrap();
        std::fs::create_dir_all(fixture.backend()).unwrap();
        fixture
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn work(&self) -> PathBuf {
        self.path().join("work")
    }

    pub fn remote(&self) -> PathBuf {
        self.path().join("remote.git")
    }

    pub fn frontend(&self) -> PathBuf {
        self.path().join("frontend")
    }

    pub fn backend(&self) -> PathBuf {
        self.path().join("backend")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("patchline.toml")
    }

    /// Write a `format-patch` style patch that adds `file` to the base
    /// commit. Patches created this way apply in any order.
    pub fn add_patch(&self, dir: &Path, patch_name: &str, file: &str, subject: &str) -> PathBuf {
        let work = self.work();
        std::fs::write(work.join(file), format!("{file}\n")).unwrap();
        git(&work, &["add", file]);
        git(&work, &["commit", "-m", subject]);
        let text = git(&work, &["format-patch", "-1", "--stdout", "HEAD"]);
        git(&work, &["reset", "--hard", "HEAD~1"]);

        let path = dir.join(patch_name);
        std::fs::write(&path, format!("{text}\n")).unwrap();
        path
    }

    /// Write a patch whose context does not match `hello.txt`.
    pub fn add_broken_patch(&self, dir: &Path, patch_name: &str) -> PathBuf {
        let text = "\
From 0000000000000000000000000000000000000000 Mon Sep 17 00:00:00 2001
From: Someone <someone@example.com>
Subject: [PATCH] Rewrite greeting

---
 hello.txt | 2 +-
 1 file changed, 1 insertion(+), 1 deletion(-)

diff --git a/hello.txt b/hello.txt
--- a/hello.txt
+++ b/hello.txt
@@ -1 +1 @@
-goodbye
+hello again
";
        let path = dir.join(patch_name);
        std::fs::write(&path, text).unwrap();
        path
    }

    /// Write `patchline.toml` with two contributors over a two-day window
    /// in UTC. `extra` is appended verbatim.
    pub fn write_config(&self, percentage: u32, extra: &str) {
        let text = format!(
            r#"[sources]
frontend = "frontend"
backend = "backend"

[[contributors]]
name = "Ada Lovelace"
email = "ada@example.com"
percentage = 50

[[contributors]]
name = "Grace Hopper"
email = "grace@example.com"
percentage = 50

[schedule]
start = 2024-10-01T00:00:00
end = 2024-10-03T00:00:00
percentage = {percentage}
utc_offset = "+00:00"
seed = 7

[repo]
path = "work"
{extra}"#
        );
        std::fs::write(self.config_path(), text).unwrap();
    }

    /// Run patchline with `--config` pointing at this fixture.
    pub fn patchline(&self, args: &[&str]) -> Output {
        let config = self.config_path().display().to_string();
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        full.extend_from_slice(args);
        full.push("--config");
        full.push(&config);
        patchline_in(self.path(), &full)
    }

    /// `git log` of the working repo, oldest first, one line per commit.
    pub fn log(&self, format: &str) -> Vec<String> {
        let out = git(
            &self.work(),
            &["log", "--reverse", &format!("--format={format}")],
        );
        out.lines().map(str::to_owned).collect()
    }

    /// The commit `main` points at on the bare remote.
    pub fn remote_head(&self) -> String {
        git(&self.remote(), &["rev-parse", "main"])
    }

    pub fn work_head(&self) -> String {
        git(&self.work(), &["rev-parse", "HEAD"])
    }
}

/// Run the patchline binary in `dir`.
pub fn patchline_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_patchline"))
        .args(args)
        .current_dir(dir)
        .env_remove("PATCHLINE_CONFIG")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run patchline")
}

/// Run git and return trimmed stdout, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

pub fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}
