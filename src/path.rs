//! Path resolution (component G): splitting a `device:/a/b/c` path and
//! walking `LOOKUP` calls from the export root or the cached current
//! directory to a filehandle.

use crate::nfs3::{self, Nfs3Call};
use crate::{Error, FileHandle};

/// Splits `path` into its device prefix and the remainder, e.g.
/// `"nfs:/a/b"` -> `("nfs", "/a/b")`. A path with no `:` is treated as
/// entirely device-relative and rejected, since every operation needs a
/// registered device to operate against.
pub(crate) fn split_device(path: &str) -> Result<(&str, &str), Error> {
    match path.split_once(':') {
        Some((device, rest)) if !device.is_empty() && !rest.contains(':') => Ok((device, rest)),
        _ => Err(Error::InvalidPath(path.to_string())),
    }
}

/// The cached current-directory entry of a mount, if any.
pub(crate) struct Cwd<'a> {
    pub(crate) fh: &'a FileHandle,
    pub(crate) path: &'a str,
}

/// Resolves `path` (the portion of the input after the device prefix) to a
/// filehandle, starting from `root` if the path is absolute or no current
/// directory is cached, otherwise from `cwd`.
pub(crate) fn resolve(
    call: &mut Nfs3Call<'_>,
    root: &FileHandle,
    cwd: Option<Cwd<'_>>,
    path: &str,
    only_directories: bool,
) -> Result<FileHandle, Error> {
    if path.is_empty() {
        return Ok(root.clone());
    }

    let absolute = path.starts_with('/');

    if let Some(ref cwd) = cwd {
        if !absolute && cwd.path == path {
            return Ok(cwd.fh.clone());
        }
    }

    let mut current = if absolute || cwd.is_none() {
        root.clone()
    } else {
        cwd.unwrap().fh.clone()
    };

    let segments = path.trim_start_matches('/').split('/').filter(|s| !s.is_empty());

    let mut last: Option<(FileHandle, bool)> = None;
    for segment in segments {
        let (fh, attrs) = nfs3::lookup(call, &current, segment).map_err(|e| match e {
            Error::NfsError(2) => Error::NoEntry,
            other => other,
        })?;

        let is_dir = attrs
            .map(|a| a.file_type == crate::FileType::Dir)
            .unwrap_or(true);

        current = fh.clone();
        last = Some((fh, is_dir));
    }

    if let Some((fh, is_dir)) = last {
        if only_directories && !is_dir {
            return Err(Error::NotADirectory);
        }
        return Ok(fh);
    }

    // No segments beyond `/` or `.`; resolved to the starting point itself.
    Ok(current)
}

/// Splits `path` at the last `/`, resolving the prefix to a directory
/// filehandle and returning `(dir_fh, basename)`. If no `/` is present, the
/// directory is `cwd`; if `cwd` is unset, fails with [`Error::NotADirectory`].
pub(crate) fn dir_of(
    call: &mut Nfs3Call<'_>,
    root: &FileHandle,
    cwd: Option<Cwd<'_>>,
    path: &str,
) -> Result<(FileHandle, String), Error> {
    match path.rfind('/') {
        Some(idx) => {
            let (dir_path, basename) = (&path[..idx], &path[idx + 1..]);
            if basename.is_empty() {
                return Err(Error::InvalidPath(path.to_string()));
            }
            let dir_fh = resolve(call, root, cwd, dir_path, true)?;
            Ok((dir_fh, basename.to_string()))
        }
        None => match cwd {
            Some(cwd) => Ok((cwd.fh.clone(), path.to_string())),
            None => Err(Error::NotADirectory),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_device() {
        assert_eq!(split_device("nfs:/a/b").unwrap(), ("nfs", "/a/b"));
        assert_eq!(split_device("nfs:file").unwrap(), ("nfs", "file"));
        assert!(split_device("noColon").is_err());
        assert!(split_device(":/a").is_err());
        assert!(split_device("nfs:/a:b").is_err());
    }
}
