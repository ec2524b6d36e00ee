use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use crate::runtime::Runtime;

/// Points the stable link at `target`, replacing whatever is there.
///
/// The new symlink is created at a temporary name alongside the link and
/// renamed over the old path, which is atomic on POSIX filesystems: an
/// observer sees either the previous link or the new one, never a missing
/// link. A no-op when the link already resolves to `target`.
#[tracing::instrument(skip(runtime, target, link))]
pub fn replace_link<R: Runtime>(runtime: &R, target: &Path, link: &Path) -> Result<()> {
    let bin_dir = link
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Link path {:?} has no parent directory", link))?;
    runtime
        .create_dir_all(bin_dir)
        .with_context(|| format!("Failed to create bin directory {:?}", bin_dir))?;

    if runtime.is_symlink(link) {
        match runtime.read_link(link) {
            Ok(existing) if existing == target => {
                debug!("Link {:?} already points to {:?}", link, target);
                return Ok(());
            }
            Ok(existing) => {
                debug!(
                    "Link {:?} points to {:?}, replacing with {:?}",
                    link, existing, target
                );
            }
            Err(_) => {
                debug!("Link {:?} is unreadable, replacing", link);
            }
        }
    } else if runtime.exists(link) {
        // A regular file is squatting on the link path; rename does not
        // reliably replace it with a symlink everywhere, so clear it.
        debug!("Removing non-symlink {:?} before linking", link);
        runtime
            .remove_file(link)
            .with_context(|| format!("Failed to remove file at link path {:?}", link))?;
    }

    let staged = link.with_file_name(format!(
        "{}.new",
        link.file_name()
            .ok_or_else(|| anyhow::anyhow!("Link path {:?} has no file name", link))?
            .to_string_lossy()
    ));

    if runtime.is_symlink(&staged) || runtime.exists(&staged) {
        runtime
            .remove_symlink(&staged)
            .with_context(|| format!("Failed to clear stale staged link {:?}", staged))?;
    }

    runtime
        .symlink(target, &staged)
        .with_context(|| format!("Failed to create symlink {:?} -> {:?}", staged, target))?;
    runtime
        .rename(&staged, link)
        .with_context(|| format!("Failed to move symlink into place at {:?}", link))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_file(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_replace_link_creates_new() {
        let rt = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages/foo/foo.1.0");
        let link = dir.path().join("bin/foo");
        write_file(&target, "v1");

        replace_link(&rt, &target, &link).unwrap();

        assert!(link.is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), target);
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "v1");
    }

    #[test]
    fn test_replace_link_swaps_old_target() {
        let rt = RealRuntime;
        let dir = tempdir().unwrap();
        let old = dir.path().join("packages/foo/foo.1.0");
        let new = dir.path().join("packages/foo/foo.2.0");
        let link = dir.path().join("bin/foo");
        write_file(&old, "v1");
        write_file(&new, "v2");

        replace_link(&rt, &old, &link).unwrap();
        replace_link(&rt, &new, &link).unwrap();

        // Exactly one link, pointing at the new artifact
        assert_eq!(std::fs::read_link(&link).unwrap(), new);
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "v2");
        assert!(!dir.path().join("bin/foo.new").exists());
        // The old artifact file itself is untouched
        assert_eq!(std::fs::read_to_string(&old).unwrap(), "v1");
    }

    #[test]
    fn test_replace_link_replaces_dangling_link() {
        let rt = RealRuntime;
        let dir = tempdir().unwrap();
        let gone = dir.path().join("packages/foo/foo.0.9");
        let target = dir.path().join("packages/foo/foo.1.0");
        let link = dir.path().join("bin/foo");
        write_file(&target, "v1");
        std::fs::create_dir_all(link.parent().unwrap()).unwrap();
        rt.symlink(&gone, &link).unwrap();

        replace_link(&rt, &target, &link).unwrap();

        assert_eq!(std::fs::read_link(&link).unwrap(), target);
    }

    #[test]
    fn test_replace_link_replaces_regular_file() {
        let rt = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages/foo/foo.1.0");
        let link = dir.path().join("bin/foo");
        write_file(&target, "v1");
        write_file(&link, "not a symlink");

        replace_link(&rt, &target, &link).unwrap();

        assert!(link.is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), target);
    }

    #[test]
    fn test_replace_link_noop_when_current() {
        let mut runtime = MockRuntime::new();
        let target = PathBuf::from("/root/packages/foo/foo.1.0");
        let link = PathBuf::from("/root/bin/foo");

        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/root/bin")))
            .returning(|_| Ok(()));
        runtime
            .expect_is_symlink()
            .with(eq(link.clone()))
            .returning(|_| true);
        runtime
            .expect_read_link()
            .with(eq(link.clone()))
            .returning(|_| Ok(PathBuf::from("/root/packages/foo/foo.1.0")));

        // No symlink/rename expectations: creating one would fail the test
        replace_link(&runtime, &target, &link).unwrap();
    }
}
