//! Interactive confirmations.

use std::io::{self, BufRead, Write};

/// Checklist shown before the scan starts.
pub const READINESS_TEXT: &str = "\
Please ensure:

1. USB debugging is enabled on your phone
2. Phone is connected via USB
3. ADB is authorized on your phone

To enable USB debugging:
1. Go to Settings > About phone
2. Tap Build number 7 times
3. Go to Settings > Developer options
4. Enable USB debugging";

/// Whether the process runs with root privileges.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}

/// Ask a yes/no question; anything but `y`/`yes` (or EOF) is no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    write!(output, "{} (y/N): ", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Wait for the operator to press Enter. Returns false on EOF.
pub fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> io::Result<bool> {
    write!(output, "\n{}", message)?;
    output.flush()?;
    let mut line = String::new();
    Ok(input.read_line(&mut line)? > 0)
}
