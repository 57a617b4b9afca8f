//! Settings read from the environment.

use crate::toolchain::Jdk;
use anyhow::bail;
use std::path::PathBuf;

/// Values of `INCJC_DEBUG` that turn on debug logging.
const TRUTHY: &[&str] = &["1", "true", "TRUE", "yes", "Y"];

#[derive(Debug, Clone)]
pub struct Config {
    pub debug: bool,
    pub jdk: Jdk,
    /// Directory under which per-source-tree metadata stores live.
    pub meta_root: PathBuf,
    /// Where to write a Chrome trace of the build phases, if anywhere.
    pub trace_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup; empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let meta_root = match var("INCJC_META_ROOT")
            .or_else(|| var("HOME"))
            .or_else(|| var("USERPROFILE"))
        {
            Some(dir) => PathBuf::from(dir),
            None => bail!("cannot locate home directory; set HOME or INCJC_META_ROOT"),
        };

        Ok(Config {
            debug: var("INCJC_DEBUG").map_or(false, |v| TRUTHY.contains(&v.as_str())),
            jdk: Jdk {
                home: var("JDK_HOME").or_else(|| var("JAVA_HOME")).map(PathBuf::from),
                extra_classpath: var("CLASSPATH"),
            },
            meta_root,
            trace_path: var("INCJC_TRACE").map(PathBuf::from),
        })
    }
}
