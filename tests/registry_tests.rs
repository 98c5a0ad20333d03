mod common;

use common::{TestResult, write_file};
use maxe::ext::{MAXE_EXT_NAMESPACE, Reader};
use maxe::extension::{CallContext, ExtensionError, ExtensionTable, XPathArg};
use maxe::types::{Namespace, XmlItem};
use maxe::{ExtensionKind, Maxe, MaxeError};
use tempfile::tempdir;

#[test]
fn registered_function_appears_in_context_snapshot() -> TestResult {
    let maxe = Maxe::new()?;
    maxe.registry().register_function("example-uri", "double", |_, args| {
        let x = args.first().map(XPathArg::as_number).transpose()?.unwrap_or(0.0);
        Ok(XPathArg::Number(x * 2.0))
    })?;

    let ctx = maxe.context(Vec::<std::path::PathBuf>::new());
    let doubles: Vec<_> = ctx
        .extensions()
        .iter()
        .filter(|e| e.name().clark() == "{example-uri}double")
        .collect();
    assert_eq!(doubles.len(), 1);
    assert_eq!(doubles[0].kind(), ExtensionKind::Function);

    let table = ExtensionTable::from_extensions(ctx.extensions());
    let call = CallContext::new(maxe.symbols());
    let result = table.call_function("example-uri", "double", &call, vec![XPathArg::from("21")])?;
    assert_eq!(result, XPathArg::Number(42.0));
    Ok(())
}

#[test]
fn duplicate_registration_keeps_the_first() -> TestResult {
    let maxe = Maxe::new()?;
    maxe.registry()
        .register_function("example-uri", "double", |_, _| Ok(XPathArg::Number(1.0)))?;
    let err = maxe
        .registry()
        .register_function("example-uri", "double", |_, _| Ok(XPathArg::Number(2.0)))
        .unwrap_err();
    assert!(matches!(err, ExtensionError::DuplicateExtension { ref name } if name == "{example-uri}double"));

    let table = ExtensionTable::from_extensions(&maxe.registry().snapshot());
    let call = CallContext::new(maxe.symbols());
    assert_eq!(
        table.call_function("example-uri", "double", &call, vec![])?,
        XPathArg::Number(1.0)
    );
    Ok(())
}

#[test]
fn builtins_are_registered() -> TestResult {
    let maxe = Maxe::new()?;
    let names: Vec<_> = maxe.registry().snapshot().iter().map(|e| e.name().clark().to_string()).collect();
    assert_eq!(
        names,
        vec![
            format!("{{{}}}get-path-stat", MAXE_EXT_NAMESPACE),
            format!("{{{}}}list-directory", MAXE_EXT_NAMESPACE),
            format!("{{{}}}scan-directory", MAXE_EXT_NAMESPACE),
            format!("{{{}}}read-file", MAXE_EXT_NAMESPACE),
            format!("{{{}}}read-text", MAXE_EXT_NAMESPACE),
        ]
    );
    assert_eq!(maxe.readers().formats(), vec![".xml", "text/xml", "xml"]);
    Ok(())
}

#[test]
fn reader_registered_later_is_seen_by_read_text() -> TestResult {
    let maxe = Maxe::new()?;
    let table = ExtensionTable::from_extensions(&maxe.registry().snapshot());
    let call = CallContext::new(maxe.symbols());
    let args = || vec![XPathArg::from("a,b"), XPathArg::from("csv")];

    let before = table.call_function(MAXE_EXT_NAMESPACE, "read-text", &call, args())?;
    assert_eq!(before.as_node_set()?[0].name.as_ref().map(|n| n.local_name()), Some("error"));

    let symbols = std::sync::Arc::clone(maxe.symbols());
    maxe.readers().register(
        Reader::new("CSV").with_text_reader(move |text, _, _| {
            let mut row = XmlItem::element(symbols.qname_in("", "row"), "");
            for cell in text.split(',') {
                row.push_child(XmlItem::element(symbols.qname_in("", "cell"), cell));
            }
            Ok(row)
        }),
        [".csv", "text/csv"],
    )?;

    let after = table.call_function(MAXE_EXT_NAMESPACE, "read-text", &call, args())?;
    let row = &after.as_node_set()?[0];
    assert_eq!(row.value, "ab");
    assert_eq!(row.child_elements().count(), 2);
    Ok(())
}

#[test]
fn context_prefix_bindings() -> TestResult {
    let maxe = Maxe::new()?;
    let mut ctx = maxe.context(Vec::<std::path::PathBuf>::new());
    let ext: Namespace = maxe.symbols().namespace(MAXE_EXT_NAMESPACE);
    ctx.add_namespace_prefix(&ext, "mx")?;
    ctx.add_namespace_prefix(&ext, "mx")?;
    let other = maxe.symbols().namespace("urn:other");
    assert!(ctx.add_namespace_prefix(&other, "mx").is_err());
    assert_eq!(ctx.prefixes().len(), 1);
    Ok(())
}

#[test]
fn resolve_probes_paths_in_insertion_order() -> TestResult {
    let first = tempdir()?;
    let second = tempdir()?;
    write_file(second.path(), "dtd/doc.dtd", "<!ELEMENT doc ANY>")?;
    let in_first = write_file(first.path(), "dtd/doc.dtd", "<!ELEMENT doc ANY>")?;

    let maxe = Maxe::new()?;
    let ctx = maxe.context([first.path(), second.path(), first.path()]);
    assert_eq!(ctx.paths().len(), 2);
    assert_eq!(maxe.resolve(&ctx, "dtd/doc.dtd")?, in_first);
    assert!(matches!(maxe.resolve(&ctx, "dtd/none.dtd"), Err(MaxeError::NotFound(_))));
    Ok(())
}
