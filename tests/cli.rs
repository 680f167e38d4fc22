//! Drives the built binary against a fake cgroup tree.
#![cfg(target_os = "linux")]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn escape(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "\\134")
        .replace(' ', "\\040")
        .replace('\t', "\\011")
}

/// Creates `<tmp>/<name>/cgroup` with the given v2 limit files and a
/// mountinfo pointing at it. Returns the mountinfo path.
fn fake_v2(name: &str, max: &str, swap: &str) -> PathBuf {
    let root = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    let cgroup = root.join("cgroup");
    fs::create_dir_all(&cgroup).unwrap();
    fs::write(cgroup.join("memory.max"), max).unwrap();
    fs::write(cgroup.join("memory.swap.max"), swap).unwrap();

    let mountinfo = root.join("mountinfo");
    fs::write(
        &mountinfo,
        format!(
            "22 1 0:21 / /proc rw,nosuid shared:5 - proc proc rw\n\
             25 22 0:23 / {} rw,nosuid,nodev - cgroup2 cgroup2 rw\n",
            escape(&cgroup)
        ),
    )
    .unwrap();
    mountinfo
}

struct Run<'a> {
    mountinfo: &'a Path,
    node_options: Option<&'a str>,
    runtime: Option<&'a str>,
    dry_run: bool,
}

impl<'a> Run<'a> {
    fn new(mountinfo: &'a Path) -> Self {
        Self {
            mountinfo,
            node_options: None,
            runtime: None,
            dry_run: false,
        }
    }

    fn output(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_heapcap"));
        cmd.env_remove("HEAPCAP_OPTIONS_VAR")
            .env_remove("RUST_LOG")
            .env("HEAPCAP_MOUNTINFO", self.mountinfo);
        match self.node_options {
            Some(v) => cmd.env("NODE_OPTIONS", v),
            None => cmd.env_remove("NODE_OPTIONS"),
        };
        match self.runtime {
            Some(v) => cmd.env("HEAPCAP_RUNTIME", v),
            None => cmd.env_remove("HEAPCAP_RUNTIME"),
        };
        if self.dry_run {
            cmd.env("HEAPCAP_DRY_RUN", "1");
        } else {
            cmd.env_remove("HEAPCAP_DRY_RUN");
        }
        cmd.args(args).output().expect("run heapcap")
    }
}

fn dry_run(mountinfo: &Path, node_options: Option<&str>) -> serde_json::Value {
    dry_run_with_args(mountinfo, node_options, &["app.js", "--flag"])
}

fn dry_run_with_args(
    mountinfo: &Path,
    node_options: Option<&str>,
    args: &[&str],
) -> serde_json::Value {
    let out = Run {
        node_options,
        dry_run: true,
        ..Run::new(mountinfo)
    }
    .output(args);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).expect("dry run prints json")
}

#[test]
fn dry_run_reports_derived_flag() {
    let mountinfo = fake_v2("dry_run_v2", "2147483648\n", "0\n");
    let plan = dry_run(&mountinfo, None);
    assert_eq!(plan["program"], "node");
    assert_eq!(plan["args"], serde_json::json!(["app.js", "--flag"]));
    assert_eq!(plan["derived"], "--max-old-space-size=2048");
    assert_eq!(plan["options"], " --max-old-space-size=2048");
}

#[test]
fn dry_run_with_unbounded_swap_only_adds_space() {
    let mountinfo = fake_v2("dry_run_swap_max", "2147483648\n", "max\n");
    let plan = dry_run(&mountinfo, Some("--enable-source-maps"));
    assert_eq!(plan["derived"], "");
    assert_eq!(plan["options"], "--enable-source-maps ");
    assert_eq!(plan["limit"], "unbounded");
}

#[test]
fn dry_run_respects_caller_flag() {
    let mountinfo = fake_v2("dry_run_explicit", "2147483648\n", "0\n");
    let plan = dry_run(&mountinfo, Some("--max-old-space-size=300"));
    assert_eq!(plan["options"], serde_json::Value::Null);
    assert_eq!(plan["limit"], serde_json::Value::Null);
}

#[test]
fn missing_mount_table_still_launches() {
    let mountinfo = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("no_such_mountinfo");
    let plan = dry_run(&mountinfo, None);
    assert_eq!(plan["options"], " ");
}

#[test]
fn help_and_version_go_to_the_runtime() {
    let mountinfo = fake_v2("dry_run_version", "max", "max");
    let plan = dry_run_with_args(&mountinfo, None, &["--version"]);
    assert_eq!(plan["program"], "node");
    assert_eq!(plan["args"], serde_json::json!(["--version"]));

    let plan = dry_run_with_args(&mountinfo, None, &["--help", "--dry-run", "--runtime", "x"]);
    assert_eq!(
        plan["args"],
        serde_json::json!(["--help", "--dry-run", "--runtime", "x"])
    );
}

#[test]
fn child_receives_wrapper_looking_flags() {
    let mountinfo = fake_v2("exec_version", "max", "max");
    let out = Run {
        runtime: Some("printf"),
        ..Run::new(&mountinfo)
    }
    .output(&["%s|", "--version", "--help"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "--version|--help|");
}

#[test]
fn child_sees_injected_options() {
    let mountinfo = fake_v2("exec_v2", "104857600", "52428800");
    let out = Run {
        node_options: Some("--trace-warnings"),
        runtime: Some("sh"),
        ..Run::new(&mountinfo)
    }
    .output(&["-c", "printf '%s' \"$NODE_OPTIONS\""]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "--trace-warnings --max-old-space-size=150"
    );
}

#[test]
fn child_exit_status_is_final() {
    let mountinfo = fake_v2("exec_status", "max", "max");
    let out = Run {
        runtime: Some("sh"),
        ..Run::new(&mountinfo)
    }
    .output(&["-c", "exit 7"]);
    assert_eq!(out.status.code(), Some(7));
}

#[test]
fn unknown_runtime_fails() {
    let mountinfo = fake_v2("exec_missing", "max", "max");
    let out = Run {
        runtime: Some("/definitely/not/a/runtime"),
        ..Run::new(&mountinfo)
    }
    .output(&["x.js"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to launch"));
}
