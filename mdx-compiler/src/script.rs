//! Generated script document
//!
//!     The script document is what a JavaScript/TypeScript analyzer sees. It is laid out as:
//!
//!         prefix           optional `// @ts-check` and the JSX runtime pragma
//!         module shadow    ESM at its original columns, everything else blank
//!         component open   `export default function MDXContent(props) { return <>`
//!         code shadow      JSX and expressions at their original columns
//!         component close  `</> }`
//!
//!     Both shadows have the source's length, so a mapped byte at source offset `s` lands at
//!     `prefix + s` in the module part and at `prefix + len + COMPONENT_OPEN + s` in the code
//!     part. Mapped content is copied with [MappedText::push_source]; blank padding in between
//!     is copied from the shadow unmapped.
//!
//!     A module may have its own default export, usually a layout. The component then stays a
//!     plain function: its `export default` is blanked to spaces of the same width, so the
//!     script has one default export and the offsets above do not move.

use crate::classify::RangeSet;
use crate::mapping::{MappedText, Mapping};
use crate::shadow::Shadows;
use mdx_parser::mdx::lexing::identifiers;
use std::ops::Range as ByteRange;

pub const CHECK_JS_PRAGMA: &str = "// @ts-check\n";

pub const COMPONENT_OPEN: &str = "\n/** @param {{readonly [key: string]: unknown}} props */\nexport default function MDXContent(props) {\n  return <>\n";

const DEFAULT_EXPORT: &str = "export default";

pub const COMPONENT_CLOSE: &str = "\n  </>\n}\n";

/// Script document used when the MDX could not be parsed. It has no mappings.
pub const FALLBACK_SCRIPT: &str = "export default function MDXContent() {}\n";

/// The text placed before the module shadow.
pub fn prefix(check_js: bool, jsx_import_source: &str) -> String {
    let mut prefix = String::new();
    if check_js {
        prefix.push_str(CHECK_JS_PRAGMA);
    }
    prefix.push_str("/* @jsxRuntime automatic\n@jsxImportSource ");
    prefix.push_str(jsx_import_source);
    prefix.push_str(" */\n");
    prefix
}

/// The component header; `exported` is false when the module has a default export already.
pub fn component_open(exported: bool) -> String {
    if exported {
        COMPONENT_OPEN.to_string()
    } else {
        COMPONENT_OPEN.replacen(DEFAULT_EXPORT, &" ".repeat(DEFAULT_EXPORT.len()), 1)
    }
}

/// True for `export default ...` and `export {x as default}`.
pub fn is_default_export(statement: &str) -> bool {
    let names: Vec<_> = identifiers(statement)
        .into_iter()
        .filter(|ident| !ident.is_property)
        .map(|ident| ident.name)
        .collect();
    if names.first() != Some(&"export") {
        return false;
    }
    names.get(1) == Some(&"default")
        || names
            .windows(2)
            .any(|pair| pair[0] == "as" && pair[1] == "default")
}

/// Copy `shadow`, mapping the bytes inside `ranges` back to the source.
fn push_shadow(out: &mut MappedText<'_>, shadow: &str, ranges: &[ByteRange<usize>]) {
    let mut cursor = 0;
    for range in ranges {
        out.push_str(&shadow[cursor..range.start]);
        out.push_source(range.clone());
        cursor = range.end;
    }
    out.push_str(&shadow[cursor..]);
}

/// Assemble the script document from the two shadows.
pub fn assemble_script(
    source: &str,
    shadows: &Shadows,
    module: &RangeSet,
    code: &RangeSet,
    check_js: bool,
    jsx_import_source: &str,
) -> (String, Mapping) {
    let mut out = MappedText::new(source);
    out.push_str(&prefix(check_js, jsx_import_source));
    let has_default = module
        .ranges()
        .iter()
        .any(|statement| is_default_export(&source[statement.clone()]));
    push_shadow(&mut out, &shadows.module, module.merged());
    out.push_str(&component_open(!has_default));
    push_shadow(&mut out, &shadows.code, code.merged());
    out.push_str(COMPONENT_CLOSE);
    out.finish()
}
