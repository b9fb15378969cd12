use mdx_analysis::features::{
    completion::completions, definition::definition, diagnostics::diagnostics,
    document_symbols::document_symbols, hover::hover, rename::rename,
};
use mdx_analysis::AnalyzerRegistry;
use mdx_compiler::{CompileOptions, VirtualFile};
use mdx_config::{Loader, MdxConfig};
use rstest::rstest;

const DOCUMENT: &str = "import {Größe} from './units.js'\n\n# Maße für {Größe} 😀\n\n<Größe wert={1} />\n";

fn file(source: &str) -> VirtualFile {
    VirtualFile::new("file:///units.mdx", source, CompileOptions::default())
}

fn registry() -> AnalyzerRegistry {
    AnalyzerRegistry::with_defaults(&MdxConfig::default())
}

#[rstest]
#[case::expression(1)]
#[case::element(2)]
fn test_non_ascii_names_map_back_exactly(#[case] occurrence: usize) {
    let usage = DOCUMENT.match_indices("Größe").nth(occurrence).unwrap().0;
    let targets = definition(&file(DOCUMENT), &registry(), usage);
    assert_eq!(targets.len(), 1);
    assert_eq!(&DOCUMENT[targets[0].clone()], "Größe");
    assert_eq!(targets[0].start, DOCUMENT.find("Größe").unwrap());

    let hovered = hover(&file(DOCUMENT), &registry(), usage).unwrap();
    assert_eq!(&DOCUMENT[hovered.range.unwrap()], "Größe");
}

#[test]
fn test_rename_round_trip_on_non_ascii_source() {
    let usage = DOCUMENT.rfind("Größe").unwrap();
    let edits = rename(&file(DOCUMENT), &registry(), usage, "Weite").unwrap();
    assert_eq!(edits.len(), 3);
    for edit in &edits {
        assert_eq!(&DOCUMENT[edit.range.clone()], "Größe");
    }
}

#[test]
fn test_configuration_switches_diagnostics() {
    let source = "import {Unused} from 'x'\n\n<Missing />\n";
    assert_eq!(diagnostics(&file(source), &registry()).len(), 2);

    let quiet = Loader::new()
        .with_toml("[diagnostics]\nunused_imports = false\nundefined_components = false\n")
        .build()
        .unwrap();
    let registry = AnalyzerRegistry::with_defaults(&quiet);
    assert!(diagnostics(&file(source), &registry).is_empty());
}

#[test]
fn test_update_recompiles_features() {
    let mut file = file("# Draft\n");
    assert!(completions(&file, &registry(), 3).is_empty());
    assert_eq!(document_symbols(&file, &registry())[0].name, "Draft");

    file.update("export const draft = true\n\n{dr}\n");
    let typed = file.source().find("{dr").unwrap() + 3;
    let labels: Vec<_> = completions(&file, &registry(), typed)
        .into_iter()
        .map(|item| item.label)
        .collect();
    assert_eq!(labels, vec!["draft"]);
}
