use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};

/// Device node path for bus `n` under `dev_dir`, following the kernel's
/// `/dev/i2c-<N>` convention.
pub fn bus_node(dev_dir: &Path, n: u32) -> PathBuf {
    dev_dir.join(format!("i2c-{n}"))
}

/// Publish `alias` as a symlink to `target`.
///
/// A dangling link left behind by a crashed prior run is removed first. An
/// existing valid link is left untouched; anything else already sitting at
/// `alias` surfaces as an error from the symlink call.
pub fn publish_alias(alias: &Path, target: &Path) -> Result<()> {
    let map = |source: io::Error| ProvisionError::Alias {
        path: alias.to_path_buf(),
        source,
    };

    if is_dangling_link(alias) {
        fs::remove_file(alias).map_err(map)?;
    }
    if !alias.is_symlink() {
        symlink(target, alias).map_err(map)?;
    }
    Ok(())
}

/// Remove the alias link, tolerating its absence.
pub fn remove_alias(alias: &Path) -> io::Result<()> {
    match fs::remove_file(alias) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn is_dangling_link(path: &Path) -> bool {
    // `exists` traverses the link, `is_symlink` does not.
    path.is_symlink() && !path.exists()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::symlink;

    use super::{bus_node, publish_alias, remove_alias};

    #[test]
    fn bus_node_follows_dev_convention() {
        assert_eq!(
            bus_node("/dev".as_ref(), 5),
            std::path::PathBuf::from("/dev/i2c-5")
        );
    }

    #[test]
    fn publish_creates_link_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("i2c-7");
        fs::write(&target, b"").unwrap();

        let alias = dir.path().join("i2c-3");
        publish_alias(&alias, &target).unwrap();

        assert_eq!(fs::read_link(&alias).unwrap(), target);
    }

    #[test]
    fn publish_replaces_dangling_leftover() {
        let dir = tempfile::tempdir().unwrap();
        let alias = dir.path().join("i2c-3");
        symlink(dir.path().join("i2c-gone"), &alias).unwrap();

        let target = dir.path().join("i2c-7");
        fs::write(&target, b"").unwrap();
        publish_alias(&alias, &target).unwrap();

        assert_eq!(fs::read_link(&alias).unwrap(), target);
    }

    #[test]
    fn publish_leaves_valid_link_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let older = dir.path().join("i2c-2");
        fs::write(&older, b"").unwrap();

        let alias = dir.path().join("i2c-3");
        symlink(&older, &alias).unwrap();

        let target = dir.path().join("i2c-7");
        fs::write(&target, b"").unwrap();
        publish_alias(&alias, &target).unwrap();

        // Don't clobber: the pre-existing valid link stays as-is.
        assert_eq!(fs::read_link(&alias).unwrap(), older);
    }

    #[test]
    fn remove_tolerates_absent_link() {
        let dir = tempfile::tempdir().unwrap();
        remove_alias(&dir.path().join("i2c-3")).unwrap();
    }
}
