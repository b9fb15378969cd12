//! Generated prose document
//!
//!     The markdown analyzer gets the prose and nothing else. Each non-prose run that holds
//!     anything but whitespace turns into one [PLACEHOLDER], an empty HTML comment that markdown
//!     treats as an inert block or inline node. Whitespace-only runs disappear.
//!
//!     The document is built one physical line at a time and every line ending is kept, so a
//!     line `n` of the prose document is line `n` of the source. Prose inside a block element is
//!     usually indented with its JSX; lines that start inside element content lose the content's
//!     base indentation so markdown does not read them as indented code. Deeper indentation, as
//!     in nested lists, is kept.

use crate::classify::RangeSet;
use crate::mapping::{MappedText, Mapping};
use std::ops::Range as ByteRange;

pub const PLACEHOLDER: &str = "<!---->";

struct LineWriter<'o, 's> {
    out: &'o mut MappedText<'s>,
    source: &'s str,
    /// Indentation still to drop from the start of this line.
    indent: usize,
}

impl LineWriter<'_, '_> {
    fn prose(&mut self, mut range: ByteRange<usize>) {
        if self.indent > 0 {
            let strip = self.source[range.clone()]
                .bytes()
                .take(self.indent)
                .take_while(is_indent)
                .count();
            range.start += strip;
            self.indent -= strip;
        }
        if !range.is_empty() {
            self.out.push_source(range);
            self.indent = 0;
        }
    }

    fn non_prose(&mut self, range: ByteRange<usize>) {
        if !self.source[range].trim().is_empty() {
            self.out.push_str(PLACEHOLDER);
            self.indent = 0;
        }
    }
}

fn is_indent(byte: &u8) -> bool {
    *byte == b' ' || *byte == b'\t'
}

fn leading_indent(text: &str) -> usize {
    text.bytes().take_while(is_indent).count()
}

/// Indentation shared by the lines of element content: the column of its first line when only
/// indentation precedes it there, and the indent of every later non-blank line.
fn base_indent(source: &str, content: &ByteRange<usize>) -> usize {
    let line_start = source[..content.start].rfind('\n').map_or(0, |idx| idx + 1);
    let lead = &source[line_start..content.start];
    let mut base = (leading_indent(lead) == lead.len()).then_some(lead.len());
    for line in source[content.clone()].split('\n').skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let indent = leading_indent(line);
        base = Some(base.map_or(indent, |found| found.min(indent)));
    }
    base.unwrap_or(0)
}

fn write_line<'s>(
    out: &mut MappedText<'s>,
    source: &'s str,
    line: ByteRange<usize>,
    non_prose: &[ByteRange<usize>],
    indent: usize,
) {
    let mut writer = LineWriter {
        out,
        source,
        indent,
    };
    let mut pos = line.start;
    let first = non_prose.partition_point(|range| range.end <= line.start);

    for range in non_prose[first..]
        .iter()
        .take_while(|range| range.start < line.end)
    {
        let start = range.start.max(line.start);
        let end = range.end.min(line.end);
        writer.prose(pos..start.max(pos));
        writer.non_prose(start..end);
        pos = end;
    }
    writer.prose(pos..line.end);
}

/// Assemble the prose document; only prose bytes (and prose line endings) are mapped.
pub fn assemble_prose(
    source: &str,
    non_prose: &RangeSet,
    embedded_content: &RangeSet,
) -> (String, Mapping) {
    let mut out = MappedText::new(source);
    let ranges = non_prose.merged();
    let bases: Vec<(ByteRange<usize>, usize)> = embedded_content
        .ranges()
        .iter()
        .map(|content| (content.clone(), base_indent(source, content)))
        .collect();
    let mut line_start = 0;

    loop {
        let line_end = source[line_start..]
            .find('\n')
            .map(|idx| line_start + idx)
            .unwrap_or(source.len());

        // Innermost content holding the line start decides the indent.
        let indent = bases
            .iter()
            .filter(|(content, _)| content.start <= line_start && line_start < content.end)
            .last()
            .map_or(0, |(_, base)| *base);
        write_line(&mut out, source, line_start..line_end, ranges, indent);

        if line_end == source.len() {
            break;
        }
        if non_prose.contains(line_end) {
            out.push_str("\n");
        } else {
            out.push_source(line_end..line_end + 1);
        }
        line_start = line_end + 1;
    }

    out.finish()
}
