//! `get-path-stat`, `list-directory` and `scan-directory`.
//!
//! A stat element is named after what the path is:
//!
//! ```text
//! <maxe:path path/>                                         does not exist
//! <maxe:directory path name ctime mtime/>
//! <maxe:file path name ctime mtime atime size stem ext/>
//! <maxe:unknown-path-type path/>
//! ```
//!
//! Times are seconds since the Unix epoch. `ext` keeps its leading dot and
//! `stem` is the whole path without `ext`.

use super::{BuiltinError, MAXE_NAMESPACE, check_arity, node_set};
use maxe_extension::{CallContext, ExtensionError, XPathArg};
use maxe_types::{SymbolTable, XmlItem};
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn seconds(time: io::Result<SystemTime>) -> Option<String> {
    let since_epoch = time.ok()?.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_secs_f64().to_string())
}

/// Last status change on Unix, creation time elsewhere.
#[cfg(unix)]
fn ctime(meta: &Metadata) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.ctime() as f64 + meta.ctime_nsec() as f64 / 1e9).to_string())
}

#[cfg(not(unix))]
fn ctime(meta: &Metadata) -> Option<String> {
    seconds(meta.created())
}

pub(super) fn stat(symbols: &SymbolTable, path: &Path) -> XmlItem {
    let attr = |local: &str| symbols.qname_in("", local);
    let path_str = path.display().to_string();

    let Ok(meta) = fs::metadata(path) else {
        return XmlItem::element(symbols.qname_in(MAXE_NAMESPACE, "path"), "").with_attribute(attr("path"), path_str);
    };
    let local = if meta.is_dir() {
        "directory"
    } else if meta.is_file() {
        "file"
    } else {
        "unknown-path-type"
    };
    let mut item = XmlItem::element(symbols.qname_in(MAXE_NAMESPACE, local), "").with_attribute(attr("path"), &path_str);
    if !(meta.is_dir() || meta.is_file()) {
        return item;
    }

    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    item.set_attribute(attr("name"), name);
    if let Some(ctime) = ctime(&meta) {
        item.set_attribute(attr("ctime"), ctime);
    }
    if let Some(mtime) = seconds(meta.modified()) {
        item.set_attribute(attr("mtime"), mtime);
    }
    if meta.is_file() {
        if let Some(atime) = seconds(meta.accessed()) {
            item.set_attribute(attr("atime"), atime);
        }
        item.set_attribute(attr("size"), meta.len().to_string());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let stem = path_str.strip_suffix(ext.as_str()).unwrap_or(&path_str);
        item.set_attribute(attr("stem"), stem);
        item.set_attribute(attr("ext"), ext);
    }
    item
}

/// Entries of `dir`, sorted so the output does not depend on the filesystem.
fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// The stat of `dir` with the stats of its whole subtree as children.
/// Symlinked directories are listed but not descended into.
fn scan(symbols: &SymbolTable, dir: &Path) -> Result<XmlItem, BuiltinError> {
    let mut item = stat(symbols, dir);
    for entry in sorted_entries(dir)? {
        let is_real_dir = fs::symlink_metadata(&entry).map(|m| m.is_dir()).unwrap_or(false);
        let child = if is_real_dir { scan(symbols, &entry)? } else { stat(symbols, &entry) };
        item.push_child(child);
    }
    Ok(item)
}

pub(super) fn get_path_stat(ctx: &CallContext<'_>, args: Vec<XPathArg>) -> Result<XPathArg, ExtensionError> {
    check_arity("get-path-stat", &args, 1..=1)?;
    let result = args[0]
        .as_path()
        .map(|path| vec![stat(ctx.symbols, &path)])
        .map_err(BuiltinError::from);
    Ok(node_set(ctx.symbols, result))
}

pub(super) fn list_directory(ctx: &CallContext<'_>, args: Vec<XPathArg>) -> Result<XPathArg, ExtensionError> {
    check_arity("list-directory", &args, 1..=1)?;
    let list = || -> Result<Vec<XmlItem>, BuiltinError> {
        let dir = args[0].as_path()?;
        Ok(sorted_entries(&dir)?.iter().map(|p| stat(ctx.symbols, p)).collect())
    };
    Ok(node_set(ctx.symbols, list()))
}

pub(super) fn scan_directory(ctx: &CallContext<'_>, args: Vec<XPathArg>) -> Result<XPathArg, ExtensionError> {
    check_arity("scan-directory", &args, 1..=1)?;
    let result = args[0]
        .as_path()
        .map_err(BuiltinError::from)
        .and_then(|dir| scan(ctx.symbols, &dir))
        .map(|tree| vec![tree]);
    Ok(node_set(ctx.symbols, result))
}

#[cfg(test)]
mod tests {
    use super::super::MAXE_EXT_NAMESPACE;
    use super::super::tests::table;
    use super::*;
    use maxe_extension::CallContext;
    use tempfile::tempdir;

    fn names(items: &[XmlItem]) -> Vec<String> {
        items
            .iter()
            .map(|i| i.name.as_ref().unwrap().local_name().to_string())
            .collect()
    }

    #[test]
    fn test_get_path_stat_of_a_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, b"hello").unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);
        let attr = |local: &str| symbols.qname_in("", local);

        let arg = XPathArg::from(file.display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "get-path-stat", &ctx, vec![arg]).unwrap();
        let items = result.as_node_set().unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.name.as_ref().unwrap().clark(), "{urn:onegasoft:Maxe}file");
        assert_eq!(item.get_attribute(&attr("path")), Some(file.display().to_string().as_str()));
        assert_eq!(item.get_attribute(&attr("name")), Some("notes.txt"));
        assert_eq!(item.get_attribute(&attr("size")), Some("5"));
        assert_eq!(item.get_attribute(&attr("ext")), Some(".txt"));
        assert_eq!(
            item.get_attribute(&attr("stem")),
            Some(dir.path().join("notes").display().to_string().as_str())
        );
        for time in ["ctime", "mtime", "atime"] {
            let value: f64 = item.get_attribute(&attr(time)).unwrap().parse().unwrap();
            assert!(value > 0.0);
        }
    }

    #[test]
    fn test_get_path_stat_of_a_directory_and_a_missing_path() {
        let dir = tempdir().unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);
        let attr = |local: &str| symbols.qname_in("", local);

        let arg = XPathArg::from(dir.path().display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "get-path-stat", &ctx, vec![arg]).unwrap();
        let item = &result.as_node_set().unwrap()[0];
        assert_eq!(item.name.as_ref().unwrap().local_name(), "directory");
        assert!(item.get_attribute(&attr("mtime")).is_some());
        assert_eq!(item.get_attribute(&attr("size")), None);

        let missing = dir.path().join("missing");
        let arg = XPathArg::from(missing.display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "get-path-stat", &ctx, vec![arg]).unwrap();
        let item = &result.as_node_set().unwrap()[0];
        assert_eq!(item.name.as_ref().unwrap().clark(), "{urn:onegasoft:Maxe}path");
        assert_eq!(item.get_attribute(&attr("path")), Some(missing.display().to_string().as_str()));
        assert_eq!(item.attributes.len(), 1);
    }

    #[test]
    fn test_list_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a").join("inner.txt"), b"i").unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let arg = XPathArg::from(dir.path().display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "list-directory", &ctx, vec![arg]).unwrap();
        let items = result.as_node_set().unwrap();
        assert_eq!(names(items), vec!["directory", "file"]);
        assert!(items[0].children.is_empty());
    }

    #[test]
    fn test_list_missing_directory_gives_error_element() {
        let dir = tempdir().unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let arg = XPathArg::from(dir.path().join("missing").display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "list-directory", &ctx, vec![arg]).unwrap();
        let item = &result.as_node_set().unwrap()[0];
        assert_eq!(item.name.as_ref().unwrap().local_name(), "error");
        assert_eq!(item.get_attribute(&symbols.qname_in("", "type")), Some("NotFound"));
        assert!(item.get_attribute(&symbols.qname_in("", "message")).is_some());
    }

    #[test]
    fn test_scan_directory_nests_subtrees() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src").join("ext")).unwrap();
        fs::write(dir.path().join("src").join("ext").join("path.rs"), b"").unwrap();
        fs::write(dir.path().join("src").join("lib.rs"), b"").unwrap();
        fs::write(dir.path().join("README"), b"").unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let arg = XPathArg::from(dir.path().display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "scan-directory", &ctx, vec![arg]).unwrap();
        let root = &result.as_node_set().unwrap()[0];
        assert_eq!(root.name.as_ref().unwrap().local_name(), "directory");
        assert_eq!(names(&root.children), vec!["file", "directory"]);

        let src = &root.children[1];
        let name = symbols.qname_in("", "name");
        let src_children: Vec<_> = src.children.iter().map(|c| c.get_attribute(&name).unwrap()).collect();
        assert_eq!(src_children, vec!["ext", "lib.rs"]);
        assert_eq!(src.children[0].children.len(), 1);
    }

    #[test]
    fn test_scan_of_a_file_is_an_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"").unwrap();
        let (symbols, table) = table();
        let ctx = CallContext::new(&symbols);

        let arg = XPathArg::from(file.display().to_string());
        let result = table.call_function(MAXE_EXT_NAMESPACE, "scan-directory", &ctx, vec![arg]).unwrap();
        assert_eq!(names(result.as_node_set().unwrap()), vec!["error"]);
    }
}
