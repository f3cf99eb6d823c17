//! Call-site resolution from the live stack.

use backtrace::Backtrace;

/// A resolved source location: file base name, line, function base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
    pub function: String,
}

/// Resolve the call site `skip` logical frames above the immediate caller.
///
/// `skip = 0` names the function that called `resolve` itself. Inlined
/// calls count as their own logical frames. Returns `None` when the stack
/// is shorter than requested or when debug info is missing for the target
/// frame; callers treat that as "no provenance", not as an error.
#[inline(never)]
pub fn resolve(skip: usize) -> Option<CallSite> {
    let trace = Backtrace::new();

    // Logical frames, innermost first. A physical frame contributes one
    // entry per inlined symbol.
    let mut frames = Vec::new();
    for frame in trace.frames() {
        for symbol in frame.symbols() {
            frames.push((
                symbol.filename().map(|p| p.to_path_buf()),
                symbol.lineno(),
                symbol.name().map(|n| format!("{:#}", n)),
            ));
        }
    }

    // Anchor on our own frame by source file rather than a fixed offset;
    // the capture machinery above us varies across platforms and opt
    // levels.
    let anchor = frames.iter().position(|(file, _, _)| {
        file.as_deref()
            .map(|p| p.ends_with(file!()))
            .unwrap_or(false)
    })?;

    let target = anchor.checked_add(skip)?.checked_add(1)?;
    let (path, line, name) = frames.get(target)?;

    let path = path.as_deref()?;
    let file = path.file_name()?.to_string_lossy().into_owned();
    let line = (*line)?;
    let function = base_function(name.as_deref()?);

    Some(CallSite {
        file,
        line,
        function,
    })
}

/// Reduce a demangled symbol to its last two `::` segments joined with a
/// dot, e.g. `orders.create`. Keeps the location part of an encoded
/// token free of colons.
fn base_function(name: &str) -> String {
    let mut segments: Vec<&str> = name.rsplit("::").take(2).collect();
    segments.reverse();
    segments.join(".")
}
