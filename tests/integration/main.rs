//! Integration tests for venvboot
//!
//! Each test gets a scratch tree with a fake `uv`, a fake runner and a
//! config file pointing at them, so no Python toolchain is needed.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn venvboot() -> Command {
        cargo_bin_cmd!("venvboot")
    }

    #[test]
    fn help_displays() {
        venvboot()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Container entrypoint"));
    }

    #[test]
    fn version_displays() {
        venvboot()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("venvboot"));
    }

    #[test]
    fn missing_explicit_config_fails() {
        venvboot()
            .args(["--config", "/nonexistent/venvboot.toml", "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }
}

#[cfg(unix)]
mod bootstrap_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    const FAKE_UV: &str = r#"#!/bin/sh
echo "$*" >> "$UV_LOG"
for last; do :; done
case "$1" in
  venv) mkdir -p "$last/bin" ;;
  pip) [ -e "$last" ] || { echo "cannot find $last" >&2; exit 2; } ;;
esac
"#;

    const FAKE_RUNNER: &str = r#"#!/bin/sh
echo "$*" >> "$RUNNER_LOG"
exit "${RUNNER_EXIT:-0}"
"#;

    /// Scratch tree: project volume, app source, fake tools, config
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path();
            std::fs::create_dir_all(root.join("project")).unwrap();
            std::fs::create_dir_all(root.join("app")).unwrap();
            std::fs::create_dir_all(root.join("image")).unwrap();
            write_script(&root.join("bin/uv"), FAKE_UV);
            write_script(&root.join("bin/runner"), FAKE_RUNNER);

            let sandbox = Self { temp };
            sandbox.write_config(&sandbox.path("app"));
            sandbox
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.temp.path().join(rel)
        }

        fn write_config(&self, source: &Path) {
            let config = format!(
                "[project]\ndir = \"{}\"\n\n\
                 [install]\nuv = \"{}\"\nsource = \"{}\"\n\n\
                 [eager]\nvenv = \"{}\"\n\n\
                 [runner]\nprogram = \"{}\"\n",
                self.path("project").display(),
                self.path("bin/uv").display(),
                source.display(),
                self.path("image/venv").display(),
                self.path("bin/runner").display(),
            );
            std::fs::write(self.path("config.toml"), config).unwrap();
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("venvboot");
            cmd.arg("--config")
                .arg(self.path("config.toml"))
                .env("UV_LOG", self.path("uv.log"))
                .env("RUNNER_LOG", self.path("runner.log"))
                .env_remove("VENVBOOT_PROJECT_DIR")
                .env_remove("VENVBOOT_STRATEGY")
                .env_remove("VENVBOOT_HANDOFF")
                .env_remove("VENVBOOT_LOG")
                .env_remove("UV_CACHE_DIR")
                .env_remove("UV_LINK_MODE")
                .env_remove("PYTHONPATH");
            cmd
        }

        fn log_lines(&self, name: &str) -> Vec<String> {
            std::fs::read_to_string(self.path(name))
                .map(|s| s.lines().map(str::to_string).collect())
                .unwrap_or_default()
        }
    }

    fn write_script(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn lazy_start_provisions_and_hands_off() {
        let sb = Sandbox::new();

        sb.cmd().assert().success();

        assert!(sb.path("project/.venv/bin").is_dir());
        assert!(sb.path("project/.venv/.venvboot.json").is_file());
        assert!(sb.path("project/.cache/uv").is_dir());
        assert!(!sb.path("project/.venv.building").exists());

        let uv = sb.log_lines("uv.log");
        assert_eq!(uv.len(), 2);
        assert!(uv[0].starts_with("venv "));
        assert!(uv[1].starts_with("pip install --python "));

        let project = sb.path("project").display().to_string();
        assert_eq!(sb.log_lines("runner.log"), vec![project]);
    }

    #[test]
    fn second_start_skips_provisioning() {
        let sb = Sandbox::new();

        sb.cmd().arg("start").assert().success();
        sb.cmd().arg("start").assert().success();

        assert_eq!(sb.log_lines("uv.log").len(), 2);
        assert_eq!(sb.log_lines("runner.log").len(), 2);
    }

    #[test]
    fn preexisting_venv_is_used_as_is() {
        let sb = Sandbox::new();
        std::fs::create_dir_all(sb.path("project/.venv/bin")).unwrap();

        sb.cmd().assert().success();

        assert!(sb.log_lines("uv.log").is_empty());
        assert_eq!(sb.log_lines("runner.log").len(), 1);
        assert!(sb.path("project/.cache/uv").is_dir());
    }

    #[test]
    fn install_failure_aborts_then_next_start_repairs() {
        let sb = Sandbox::new();
        sb.write_config(&sb.path("no-such-app"));

        sb.cmd()
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to install"));

        assert!(sb.log_lines("runner.log").is_empty());
        assert!(sb.path("project/.venv.building").exists());
        assert!(sb.path("project/.cache/uv").is_dir());

        sb.write_config(&sb.path("app"));
        sb.cmd().assert().success();

        assert!(!sb.path("project/.venv.building").exists());
        assert!(sb.path("project/.venv/.venvboot.json").is_file());
        assert_eq!(sb.log_lines("runner.log").len(), 1);
    }

    #[test]
    fn eager_start_never_runs_uv() {
        let sb = Sandbox::new();

        sb.cmd()
            .env("VENVBOOT_STRATEGY", "eager")
            .assert()
            .success();

        assert!(sb.log_lines("uv.log").is_empty());
        assert!(!sb.path("project/.venv").exists());
        assert!(sb.path("project/.cache/uv").is_dir());
        assert_eq!(sb.log_lines("runner.log").len(), 1);
    }

    #[test]
    fn build_provisions_image_venv() {
        let sb = Sandbox::new();

        sb.cmd()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("Provisioned"));

        assert!(sb.path("image/venv/.venvboot.json").is_file());
        assert!(!sb.path("project/.venv").exists());
        assert!(sb.log_lines("runner.log").is_empty());

        sb.cmd()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("already provisioned"));
        assert_eq!(sb.log_lines("uv.log").len(), 2);
    }

    #[test]
    fn runner_exit_code_is_propagated() {
        let sb = Sandbox::new();

        sb.cmd().env("RUNNER_EXIT", "5").assert().code(5);
        sb.cmd()
            .env("RUNNER_EXIT", "6")
            .env("VENVBOOT_HANDOFF", "supervise")
            .assert()
            .code(6);
    }

    #[test]
    fn supervisor_forwards_sigterm_to_runner() {
        let sb = Sandbox::new();
        write_script(
            &sb.path("bin/runner"),
            "#!/bin/sh\ntrap 'exit 42' TERM\ntouch \"$RUNNER_READY\"\nwhile :; do sleep 0.1; done\n",
        );

        let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_venvboot"))
            .arg("--config")
            .arg(sb.path("config.toml"))
            .env("UV_LOG", sb.path("uv.log"))
            .env("RUNNER_READY", sb.path("runner.ready"))
            .env("VENVBOOT_HANDOFF", "supervise")
            .env_remove("VENVBOOT_PROJECT_DIR")
            .env_remove("VENVBOOT_STRATEGY")
            .env_remove("UV_CACHE_DIR")
            .env_remove("PYTHONPATH")
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !sb.path("runner.ready").exists() {
            assert!(Instant::now() < deadline, "runner never started");
            std::thread::sleep(Duration::from_millis(20));
        }

        // SAFETY: signalling a child process this test spawned.
        unsafe {
            libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
        }

        let status = loop {
            if let Some(status) = child.try_wait().unwrap() {
                break status;
            }
            if Instant::now() >= deadline {
                child.kill().unwrap();
                panic!("supervisor did not exit after SIGTERM");
            }
            std::thread::sleep(Duration::from_millis(20));
        };
        assert_eq!(status.code(), Some(42));
    }

    #[test]
    fn dir_flag_is_passed_before_project() {
        let sb = Sandbox::new();
        let mut config = std::fs::read_to_string(sb.path("config.toml")).unwrap();
        config.push_str("dir_flag = \"--dir\"\n");
        std::fs::write(sb.path("config.toml"), config).unwrap();

        sb.cmd().assert().success();

        let project = sb.path("project").display().to_string();
        assert_eq!(sb.log_lines("runner.log"), vec![format!("--dir {project}")]);
    }

    #[test]
    fn missing_project_dir_fails_without_creating_it() {
        let sb = Sandbox::new();

        sb.cmd()
            .arg("start")
            .arg("--project-dir")
            .arg(sb.path("unmounted"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Project directory not found"))
            .stderr(predicate::str::contains("Hint:"));

        assert!(!sb.path("unmounted").exists());
        assert!(sb.log_lines("runner.log").is_empty());
    }

    #[test]
    fn missing_runner_fails() {
        let sb = Sandbox::new();
        std::fs::remove_file(sb.path("bin/runner")).unwrap();

        sb.cmd()
            .assert()
            .failure()
            .stderr(predicate::str::contains("Runner executable not found"));
    }

    #[test]
    fn status_json_reports_state() {
        let sb = Sandbox::new();

        sb.cmd()
            .args(["status", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"state\": \"unprovisioned\""));

        sb.cmd().assert().success();

        sb.cmd()
            .args(["status", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"state\": \"provisioned\""))
            .stdout(predicate::str::contains("\"fingerprint\""));
    }

    #[test]
    fn config_show_includes_env_overrides() {
        let sb = Sandbox::new();

        sb.cmd()
            .args(["config", "show"])
            .env("UV_LINK_MODE", "hardlink")
            .assert()
            .success()
            .stdout(predicate::str::contains("[bootstrap]"))
            .stdout(predicate::str::contains("link_mode = \"hardlink\""));
    }

    #[test]
    fn invalid_env_strategy_fails() {
        let sb = Sandbox::new();

        sb.cmd()
            .env("VENVBOOT_STRATEGY", "whenever")
            .assert()
            .failure()
            .stderr(predicate::str::contains("VENVBOOT_STRATEGY"));
    }
}
