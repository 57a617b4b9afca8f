//! The external tools a build drives: a compiler that turns sources into
//! class files, and an examiner that reads class files back into facts
//! about where each class came from and what it references.
//!
//! Both are traits so the build logic can run against other toolchains,
//! or against fakes in tests.  The JDK implementations shell out to
//! `javac`, `javap` and `jdeps`.

use crate::process::{capture_output, cmdline, run_command, Termination};
use anyhow::bail;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// What the examiner learned about one compiled class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFact {
    /// Fully qualified, e.g. "com.example.Foo$Bar".
    pub class_name: String,
    /// Source file relative to the source tree, e.g. "com/example/Foo.java".
    pub source_file: PathBuf,
    /// Classes this one references, standard library excluded.
    pub dependencies: FxHashSet<String>,
}

pub trait Compiler {
    /// Compiles `sources` against `classpath` into `dest`.  Ok(false) means
    /// the compiler rejected the input; Err means it couldn't be run.
    fn compile(&self, sources: &[String], classpath: &Path, dest: &Path) -> anyhow::Result<bool>;
}

pub trait Examiner {
    fn examine(&self, class_files: &[PathBuf]) -> anyhow::Result<Vec<ClassFact>>;
}

/// Locates JDK executables.
#[derive(Debug, Clone, Default)]
pub struct Jdk {
    pub home: Option<PathBuf>,
    /// Appended to every compile classpath.
    pub extra_classpath: Option<String>,
}

impl Jdk {
    pub fn executable(&self, name: &str) -> PathBuf {
        let name = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
        match &self.home {
            Some(home) => home.join("bin").join(name),
            None => PathBuf::from(name),
        }
    }
}

const CLASSPATH_SEP: &str = if cfg!(windows) { ";" } else { ":" };

pub struct Javac {
    jdk: Jdk,
}

impl Javac {
    pub fn new(jdk: Jdk) -> Self {
        Javac { jdk }
    }

    fn command(&self, sources: &[String], classpath: &Path, dest: &Path) -> Command {
        let mut cp = classpath.as_os_str().to_owned();
        if let Some(extra) = &self.jdk.extra_classpath {
            cp.push(CLASSPATH_SEP);
            cp.push(extra);
        }
        let mut cmd = Command::new(self.jdk.executable("javac"));
        cmd.arg("-cp")
            .arg(cp)
            .arg("-d")
            .arg(dest)
            .args(sources);
        cmd
    }
}

impl Compiler for Javac {
    fn compile(&self, sources: &[String], classpath: &Path, dest: &Path) -> anyhow::Result<bool> {
        let mut cmd = self.command(sources, classpath, dest);
        let term = run_command(&mut cmd, &mut std::io::stdout(), &mut std::io::stderr())?;
        if term == Termination::Interrupted {
            bail!("{} interrupted", cmdline(&cmd));
        }
        Ok(term == Termination::Success)
    }
}

/// Examines class files with `javap` (class name and source file) and
/// `jdeps -v` (class-level dependencies).
pub struct JdkExaminer {
    jdk: Jdk,
}

impl JdkExaminer {
    pub fn new(jdk: Jdk) -> Self {
        JdkExaminer { jdk }
    }
}

impl Examiner for JdkExaminer {
    fn examine(&self, class_files: &[PathBuf]) -> anyhow::Result<Vec<ClassFact>> {
        if class_files.is_empty() {
            return Ok(Vec::new());
        }
        let javap = capture_output(
            Command::new(self.jdk.executable("javap")).args(class_files),
        )?;
        let mut facts: FxHashMap<String, ClassFact> = parse_javap(&javap)
            .into_iter()
            .map(|fact| (fact.class_name.clone(), fact))
            .collect();

        let jdeps = capture_output(
            Command::new(self.jdk.executable("jdeps"))
                .arg("-v")
                .args(class_files),
        )?;
        add_jdeps(&jdeps, &mut facts)?;
        Ok(facts.into_values().collect())
    }
}

fn is_standard_library_class(class_name: &str) -> bool {
    ["java.", "javax.", "javafx."]
        .iter()
        .any(|prefix| class_name.starts_with(prefix))
}

/// Parses a class declaration line from javap, e.g.
/// `public final class a.B<T> extends java.lang.Object {`, into "a.B".
fn declared_class(line: &str) -> Option<&str> {
    if !line.contains('{') {
        return None;
    }
    let mut words = line.split_whitespace();
    words.find(|&w| w == "class" || w == "interface")?;
    let name = words.next()?;
    Some(name.split('<').next().unwrap_or(name))
}

/// Source path of a class relative to the source tree: its package
/// directory joined with the file name javap reports.
fn relative_source(class_name: &str, file_name: &str) -> PathBuf {
    let mut path = PathBuf::new();
    if let Some((package, _)) = class_name.rsplit_once('.') {
        path.extend(package.split('.'));
    }
    path.push(file_name);
    path
}

/// Extracts one fact per class from javap's listing, which introduces each
/// class with a `Compiled from "Foo.java"` line followed by its declaration.
pub fn parse_javap(output: &str) -> Vec<ClassFact> {
    let mut facts = Vec::new();
    let mut lines = output.lines();
    while let Some(line) = lines.next() {
        let file_name = match line
            .strip_prefix("Compiled from \"")
            .and_then(|rest| rest.strip_suffix('"'))
        {
            Some(name) if name.ends_with(".java") => name,
            _ => continue,
        };
        let class_name = match lines.next().and_then(declared_class) {
            Some(name) => name,
            None => continue,
        };
        facts.push(ClassFact {
            class_name: class_name.to_owned(),
            source_file: relative_source(class_name, file_name),
            dependencies: FxHashSet::default(),
        });
    }
    facts
}

/// Adds the class-level edges from `jdeps -v` output, e.g.
/// `   a.B    -> a.C    classes`, to the facts they start from.
pub fn add_jdeps(output: &str, facts: &mut FxHashMap<String, ClassFact>) -> anyhow::Result<()> {
    for line in output.lines() {
        if !line.starts_with(char::is_whitespace) {
            continue;
        }
        let mut words = line.split_whitespace();
        let (from, to) = match (words.next(), words.next(), words.next()) {
            (Some(from), Some("->"), Some(to)) => (from, to),
            _ => continue,
        };
        if is_standard_library_class(to) {
            continue;
        }
        match facts.get_mut(from) {
            Some(fact) => {
                debug!(class = from, dependency = to, "dependency");
                fact.dependencies.insert(to.to_owned());
            }
            None => bail!("internal error; class not found: {}", from),
        }
    }
    Ok(())
}
