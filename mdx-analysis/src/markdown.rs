//! Markdown analyzer over the prose document
//!
//!     Reads the generated prose document with pulldown-cmark. Placeholders left by the
//!     compiler parse as inline or block HTML and are ignored. The service provides the
//!     heading outline and folding for heading sections, fenced code and lists.

use crate::service::{
    expect_language, LanguageService, ServiceFold, ServiceResult, ServiceSymbol,
};
use lsp_types::{FoldingRangeKind, SymbolKind};
use mdx_compiler::{LanguageTag, VirtualDocument};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::ops::Range as ByteRange;

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownService;

impl MarkdownService {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading {
    level: usize,
    text: String,
    range: ByteRange<usize>,
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

fn trim_end(text: &str, range: ByteRange<usize>) -> ByteRange<usize> {
    let trimmed = text[range.clone()].trim_end().len();
    range.start..range.start + trimmed
}

fn headings(text: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut current: Option<Heading> = None;
    for (event, range) in Parser::new_ext(text, options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level: level as usize,
                    text: String::new(),
                    range: trim_end(text, range),
                });
            }
            Event::Text(content) | Event::Code(content) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&content);
                }
            }
            Event::End(TagEnd::Heading(_)) => found.extend(current.take()),
            _ => {}
        }
    }
    found
}

/// A heading's section runs to the next heading of the same or a higher level.
fn section_end(text: &str, headings: &[Heading], index: usize) -> usize {
    let level = headings[index].level;
    let end = headings[index + 1..]
        .iter()
        .find(|heading| heading.level <= level)
        .map(|heading| heading.range.start)
        .unwrap_or(text.len());
    trim_end(text, headings[index].range.start..end).end
}

fn heading_symbol(text: &str, headings: &[Heading], index: usize) -> ServiceSymbol {
    let heading = &headings[index];
    let name = heading.text.trim();
    ServiceSymbol {
        name: if name.is_empty() {
            "Heading".to_string()
        } else {
            name.to_string()
        },
        detail: Some(format!("h{}", heading.level)),
        kind: SymbolKind::NAMESPACE,
        range: heading.range.start..section_end(text, headings, index),
        selection_range: heading.range.clone(),
        children: Vec::new(),
    }
}

fn close_until(stack: &mut Vec<(usize, ServiceSymbol)>, roots: &mut Vec<ServiceSymbol>, level: usize) {
    while stack.last().is_some_and(|(open, _)| *open >= level) {
        let Some((_, symbol)) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(symbol),
            None => roots.push(symbol),
        }
    }
}

fn is_multiline(text: &str, range: &ByteRange<usize>) -> bool {
    text[range.clone()].contains('\n')
}

impl LanguageService for MarkdownService {
    fn language(&self) -> LanguageTag {
        LanguageTag::Markdown
    }

    fn document_symbols(&self, document: &VirtualDocument) -> ServiceResult<Vec<ServiceSymbol>> {
        expect_language(self, document)?;
        let text = document.text();
        let headings = headings(text);

        let mut roots = Vec::new();
        let mut stack: Vec<(usize, ServiceSymbol)> = Vec::new();
        for index in 0..headings.len() {
            close_until(&mut stack, &mut roots, headings[index].level);
            stack.push((headings[index].level, heading_symbol(text, &headings, index)));
        }
        close_until(&mut stack, &mut roots, 0);
        Ok(roots)
    }

    fn folding_ranges(&self, document: &VirtualDocument) -> ServiceResult<Vec<ServiceFold>> {
        expect_language(self, document)?;
        let text = document.text();
        let headings = headings(text);

        let mut folds: Vec<ServiceFold> = (0..headings.len())
            .map(|index| headings[index].range.start..section_end(text, &headings, index))
            .filter(|range| is_multiline(text, range))
            .map(|range| ServiceFold {
                range,
                kind: Some(FoldingRangeKind::Region),
            })
            .collect();

        for (event, range) in Parser::new_ext(text, options()).into_offset_iter() {
            let block = matches!(
                event,
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) | Event::Start(Tag::List(_))
            );
            let range = trim_end(text, range);
            if block && is_multiline(text, &range) {
                folds.push(ServiceFold {
                    range,
                    kind: Some(FoldingRangeKind::Region),
                });
            }
        }

        folds.sort_by_key(|fold| (fold.range.start, fold.range.end));
        Ok(folds)
    }
}
