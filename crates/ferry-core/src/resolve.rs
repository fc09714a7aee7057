//! Picks what to reveal after an unpack.

use std::collections::BTreeSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Returns the distinct top-level items under `root` among `paths`.
///
/// The first component of each path relative to `root` names its top-level
/// item. Paths equal to `root`, outside it, or whose first component is `.`
/// or `..` contribute nothing.
///
/// # Examples
///
/// ```
/// use ferry_core::resolve::top_level_items;
/// use std::path::Path;
/// use std::path::PathBuf;
///
/// let items = top_level_items(
///     [Path::new("/d/a/x"), Path::new("/d/a/y"), Path::new("/d/b")],
///     Path::new("/d"),
/// );
/// assert_eq!(items.len(), 2);
/// assert!(items.contains(&PathBuf::from("/d/a")));
/// ```
pub fn top_level_items<'a, I>(paths: I, root: &Path) -> BTreeSet<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    paths
        .into_iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .filter_map(|relative| match relative.components().next() {
            Some(Component::Normal(first)) => Some(root.join(first)),
            _ => None,
        })
        .collect()
}

/// Chooses the reveal candidate for a set of written paths.
///
/// Exactly one top-level item yields that item; zero or several yield
/// `root`. Pure and infallible.
///
/// # Examples
///
/// ```
/// use ferry_core::resolve;
/// use std::path::Path;
///
/// let bundle = resolve(
///     [
///         Path::new("/d/app.app/Contents/Info.plist"),
///         Path::new("/d/app.app/Contents/MacOS/app"),
///     ],
///     Path::new("/d"),
/// );
/// assert_eq!(bundle, Path::new("/d/app.app"));
///
/// let loose = resolve([Path::new("/d/a.txt"), Path::new("/d/b.txt")], Path::new("/d"));
/// assert_eq!(loose, Path::new("/d"));
/// ```
pub fn resolve<'a, I>(paths: I, root: &Path) -> PathBuf
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut items = top_level_items(paths, root).into_iter();
    match (items.next(), items.next()) {
        (Some(only), None) => only,
        _ => root.to_path_buf(),
    }
}
