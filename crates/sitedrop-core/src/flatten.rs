//! Collapsing of redundant single-directory nesting.
//!
//! Site archives are often zipped from the parent of the project folder, so
//! everything lands under one extra `project/` level. The flattener lifts
//! such a level (repeatedly) until the entry point sits at the root.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::DeployError;
use crate::Result;

/// Prefix of the hidden name a directory is parked under while its
/// contents are lifted.
const PARK_PREFIX: &str = ".sitedrop-flatten";

/// Collapses nested single-child directories until an entry point appears.
///
/// # Examples
///
/// ```
/// use sitedrop_core::flatten::TreeFlattener;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let temp = tempfile::tempdir()?;
/// std::fs::create_dir_all(temp.path().join("project"))?;
/// std::fs::write(temp.path().join("project/index.html"), "<h1>hi</h1>")?;
///
/// let levels = TreeFlattener::new("index.html", 64).flatten(temp.path())?;
/// assert_eq!(levels, 1);
/// assert!(temp.path().join("index.html").is_file());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TreeFlattener<'a> {
    entry_point: &'a str,
    max_depth: usize,
}

impl<'a> TreeFlattener<'a> {
    /// Creates a flattener looking for `entry_point` and collapsing at most
    /// `max_depth` levels.
    #[must_use]
    pub fn new(entry_point: &'a str, max_depth: usize) -> Self {
        Self {
            entry_point,
            max_depth,
        }
    }

    /// Flattens `root` in place and returns the number of levels collapsed.
    ///
    /// Stops without modification when the entry point is already a child
    /// of `root`, when `root` has zero or several children, or when its
    /// only child is not a real directory (links are never followed).
    /// Whether the entry point was actually found is for the caller to
    /// check. Running it again on its own output is a no-op.
    ///
    /// # Errors
    ///
    /// - `DeployError::StructureTooDeep` if more than `max_depth` levels
    ///   would have to be collapsed
    /// - `DeployError::Io` if listing or renaming fails
    pub fn flatten(&self, root: &Path) -> Result<usize> {
        let mut levels = 0;

        loop {
            let children = list_children(root)?;

            if children
                .iter()
                .any(|child| child.file_name() == Some(OsStr::new(self.entry_point)))
            {
                break;
            }

            let [only] = children.as_slice() else {
                break;
            };

            // symlink_metadata: a link to a directory is not a directory here
            if !fs::symlink_metadata(only)?.file_type().is_dir() {
                break;
            }

            if levels >= self.max_depth {
                return Err(DeployError::StructureTooDeep {
                    max: self.max_depth,
                });
            }

            lift_contents(root, only)?;
            levels += 1;
            debug!(dir = %only.display(), levels, "collapsed redundant directory");
        }

        Ok(levels)
    }
}

fn list_children(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()).map_err(DeployError::from))
        .collect()
}

/// Moves every child of `child` up into `root` and removes `child`.
///
/// `child` is parked under a hidden name first, so a grandchild with the
/// same name as `child` (e.g. `site/site/`) can take its place.
fn lift_contents(root: &Path, child: &Path) -> Result<()> {
    let parked = park_name(root);
    fs::rename(child, &parked)?;

    for entry in fs::read_dir(&parked)? {
        let entry = entry?;
        fs::rename(entry.path(), root.join(entry.file_name()))?;
    }

    fs::remove_dir(&parked)?;
    Ok(())
}

fn park_name(root: &Path) -> PathBuf {
    let mut candidate = root.join(PARK_PREFIX);
    let mut n = 0u32;
    while fs::symlink_metadata(&candidate).is_ok() {
        n += 1;
        candidate = root.join(format!("{PARK_PREFIX}-{n}"));
    }
    candidate
}
