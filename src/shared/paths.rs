//! Path handling for user-supplied directories: `~` / `$VAR` expansion,
//! resolution against the executable directory and free-space lookup.

use std::io;
use std::path::{Path, PathBuf};

use crate::domain::TaskError;

/// Directory containing the running executable.
pub fn executable_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?.canonicalize()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent"))
}

/// Expand a leading `~` and `$VAR` / `${VAR}` references.
pub fn expand_cli_path(raw: &str) -> Result<PathBuf, TaskError> {
    expand_with(raw, dirs::home_dir(), |name| std::env::var(name).ok())
}

fn expand_with(
    raw: &str,
    home: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, TaskError> {
    let fail = || TaskError::Input(format!("failed to expand '{raw}'"));

    let mut out = String::with_capacity(raw.len());
    let rest = if raw == "~" || raw.starts_with("~/") || raw.starts_with("~\\") {
        let home = home.ok_or_else(fail)?;
        out.push_str(&home.to_string_lossy());
        &raw[1..]
    } else {
        raw
    };

    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let name: String = if chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(ch) => name.push(ch),
                    None => return Err(fail()),
                }
            }
            name
        } else {
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            name
        };
        if name.is_empty() {
            out.push('$');
            continue;
        }
        out.push_str(&lookup(&name).ok_or_else(fail)?);
    }

    Ok(PathBuf::from(out))
}

/// Relative paths are taken relative to `base` (the executable directory).
pub fn resolve_against(path: PathBuf, base: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

/// Free bytes available to the current user on the volume holding `path`.
/// `None` where the platform offers no lookup.
#[cfg(unix)]
pub fn available_space(path: &Path) -> io::Result<Option<u64>> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: statvfs only writes into the zeroed struct we own; c_path is NUL-terminated.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    #[allow(clippy::useless_conversion)]
    let bytes = u64::from(stat.f_bavail).saturating_mul(u64::from(stat.f_frsize));
    Ok(Some(bytes))
}

#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> io::Result<Option<u64>> {
    Ok(None)
}
