//! Chrome trace output of build phases, enabled by `INCJC_TRACE=<file>`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

static TRACE: Mutex<Option<Trace>> = Mutex::new(None);

struct Trace {
    start: Instant,
    w: BufWriter<File>,
}

impl Trace {
    fn new(path: &Path) -> std::io::Result<Self> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "[")?;
        Ok(Trace {
            start: Instant::now(),
            w,
        })
    }

    fn write_complete(&mut self, name: &str, start: Instant, end: Instant) -> std::io::Result<()> {
        write!(
            self.w,
            "{{ \"pid\": 0, \"name\": {:?}, \"ts\": {}, \"ph\": \"X\", \"dur\": {} }}",
            name,
            start.duration_since(self.start).as_micros(),
            end.duration_since(start).as_micros()
        )
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.write_complete("main", self.start, Instant::now())?;
        writeln!(self.w, "\n]")?;
        self.w.flush()
    }
}

fn with_trace<T>(f: impl FnOnce(&mut Option<Trace>) -> T) -> T {
    // A poisoned lock only means a panic elsewhere; the trace is still usable.
    let mut guard = TRACE.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

pub fn open(path: &Path) -> std::io::Result<()> {
    let trace = Trace::new(path)?;
    with_trace(|t| *t = Some(trace));
    Ok(())
}

/// Runs `f`, recording its duration as a trace event named `name` when
/// tracing is on.
pub fn scope<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    let end = Instant::now();
    with_trace(|t| {
        if let Some(t) = t {
            // Losing a trace event isn't worth failing a build over.
            let _ = t
                .write_complete(name, start, end)
                .and_then(|_| writeln!(t.w, ","));
        }
    });
    result
}

pub fn close() -> std::io::Result<()> {
    match with_trace(|t| t.take()) {
        Some(mut t) => t.close(),
        None => Ok(()),
    }
}
