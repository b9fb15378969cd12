use crate::registry::AnalyzerRegistry;
use mdx_compiler::{CompileOptions, VirtualFile};
use mdx_config::MdxConfig;

pub const SAMPLE: &str = r#"---
title: Quarterly report
---

import {Chart} from './chart.js'
import {Unused} from './unused.js'
export const year = 2024

# Results for {year}

Revenue grew again. See the <Chart data={[1, 2, 3]} /> below.

<Callout kind="note">
  Numbers are **unaudited**.

  Ask finance for {year} details.
</Callout>

## Appendix

```js
const raw = {a: 1}
```
"#;

pub fn sample_file() -> VirtualFile {
    file(SAMPLE)
}

pub fn file(source: &str) -> VirtualFile {
    VirtualFile::new("file:///sample.mdx", source, CompileOptions::default())
}

pub fn registry() -> AnalyzerRegistry {
    AnalyzerRegistry::with_defaults(&MdxConfig::default())
}

/// Byte offset of the `nth` occurrence of `needle` in `source`.
pub fn offset_of(source: &str, needle: &str, nth: usize) -> usize {
    source
        .match_indices(needle)
        .nth(nth)
        .map(|(idx, _)| idx)
        .unwrap_or_else(|| panic!("occurrence {nth} of {needle:?} not found"))
}
