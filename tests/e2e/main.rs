//! Support code for e2e tests, which run incjc as a binary against a fake
//! JDK.  The fake javac/javap/jdeps are shell scripts speaking the same toy
//! source format as the library tests: `class Name` and `uses Name` lines,
//! with an `error` line failing compilation.

#![cfg(unix)]

mod basic;
mod failures;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const FAKE_JAVAC: &str = r#"#!/bin/sh
cp=
dest=
while [ $# -gt 0 ]; do
  case "$1" in
    -cp) cp="$2"; shift 2 ;;
    -d) dest="$2"; shift 2 ;;
    *) break ;;
  esac
done
declared=$(cat "$@" | sed -n 's/^class //p')
for src in "$@"; do
  if grep -q '^error' "$src"; then
    echo "$src:1: error: bad source" >&2
    exit 1
  fi
  for dep in $(sed -n 's/^uses //p' "$src"); do
    found=
    for d in $declared; do
      [ "$d" = "$dep" ] && found=1
    done
    if [ -z "$found" ]; then
      old_ifs=$IFS
      IFS=:
      for dir in $cp; do
        [ -f "$dir/$dep.class" ] && found=1
      done
      IFS=$old_ifs
    fi
    if [ -z "$found" ]; then
      echo "$src: error: cannot find symbol $dep" >&2
      exit 1
    fi
  done
done
for src in "$@"; do
  base=$(basename "$src")
  for cls in $(sed -n 's/^class //p' "$src"); do
    {
      echo "source $base"
      echo "class $cls"
      sed -n 's/^uses /uses /p' "$src"
    } > "$dest/$cls.class"
  done
done
echo "fake javac compiled $# files"
"#;

const FAKE_JAVAP: &str = r#"#!/bin/sh
for f in "$@"; do
  echo "Compiled from \"$(sed -n 's/^source //p' "$f")\""
  echo "public class $(sed -n 's/^class //p' "$f") {"
  echo "}"
done
"#;

const FAKE_JDEPS: &str = r#"#!/bin/sh
[ "$1" = "-v" ] && shift
echo "classes -> java.base"
for f in "$@"; do
  cls=$(sed -n 's/^class //p' "$f")
  echo "   $cls -> java.lang.Object   java.base"
  for dep in $(sed -n 's/^uses //p' "$f"); do
    echo "   $cls -> $dep   classes"
  done
done
"#;

pub fn incjc_binary() -> PathBuf {
    std::env::current_exe()
        .expect("test binary path")
        .parent()
        .expect("test binary directory")
        .parent()
        .expect("binary directory")
        .join("incjc")
}

fn print_output(out: &std::process::Output) {
    // Gross: use print! instead of writing to stdout so Rust test
    // framework can capture it.
    print!("{}", std::str::from_utf8(&out.stdout).unwrap());
    print!("{}", std::str::from_utf8(&out.stderr).unwrap());
}

pub fn assert_output_contains(out: &std::process::Output, text: &str) {
    let out = std::str::from_utf8(&out.stdout).unwrap();
    if !out.contains(text) {
        panic!(
            "assertion failed; expected output to contain {:?} but got:\n{}",
            text, out
        );
    }
}

pub fn assert_output_not_contains(out: &std::process::Output, text: &str) {
    let out = std::str::from_utf8(&out.stdout).unwrap();
    if out.contains(text) {
        panic!(
            "assertion failed; expected output to not contain {:?} but got:\n{}",
            text, out
        );
    }
}

pub fn assert_stderr_contains(out: &std::process::Output, text: &str) {
    let err = std::str::from_utf8(&out.stderr).unwrap();
    if !err.contains(text) {
        panic!(
            "assertion failed; expected stderr to contain {:?} but got:\n{}",
            text, err
        );
    }
}

fn write_script(path: &Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

/// Manages a temporary directory holding a fake JDK, a metadata root, and
/// the `src` and `out` directories incjc is pointed at.
pub struct TestSpace {
    dir: tempfile::TempDir,
}
impl TestSpace {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let bin = dir.path().join("jdk/bin");
        std::fs::create_dir_all(&bin)?;
        write_script(&bin.join("javac"), FAKE_JAVAC)?;
        write_script(&bin.join("javap"), FAKE_JAVAP)?;
        write_script(&bin.join("jdeps"), FAKE_JDEPS)?;
        std::fs::create_dir(dir.path().join("src"))?;
        std::fs::create_dir(dir.path().join("meta"))?;
        Ok(TestSpace { dir })
    }

    pub fn path(&self, path: &str) -> PathBuf {
        self.dir.path().join(path)
    }

    /// Write a file into the working space.
    pub fn write(&self, path: &str, content: &str) -> std::io::Result<()> {
        std::fs::write(self.path(path), content)
    }

    pub fn remove(&self, path: &str) -> std::io::Result<()> {
        std::fs::remove_file(self.path(path))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.path(path).exists()
    }

    /// An incjc invocation building `src` into `out`, with an environment
    /// pointing at the fake JDK and nothing inherited that changes behavior.
    pub fn incjc(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(incjc_binary());
        cmd.args(["out", "src"])
            .env("JDK_HOME", self.path("jdk"))
            .env("INCJC_META_ROOT", self.path("meta"));
        for var in ["JAVA_HOME", "CLASSPATH", "INCJC_DEBUG", "INCJC_TRACE", "RUST_LOG"] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Invoke incjc, returning process output.
    pub fn run(&self, cmd: &mut std::process::Command) -> std::io::Result<std::process::Output> {
        cmd.current_dir(self.dir.path()).output()
    }

    /// Like run, but also print output if the build failed.
    pub fn run_expect(
        &self,
        cmd: &mut std::process::Command,
    ) -> anyhow::Result<std::process::Output> {
        let out = self.run(cmd)?;
        if !out.status.success() {
            print_output(&out);
            anyhow::bail!("build failed, status {}", out.status);
        }
        Ok(out)
    }

    /// Persist the temp dir locally and abort the test.  Debugging helper.
    #[allow(dead_code)]
    pub fn eject(self) -> ! {
        panic!("ejected at {:?}", self.dir.into_path());
    }
}
