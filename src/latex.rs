//! Inline math in labels. Text between unescaped `$` pairs is parsed as LaTeX
//! and flattened into a single line, with math letters set in italics.

use std::ops::Range;

use pulldown_latex::{
  Parser, Storage,
  event::{Content, Event},
};

#[derive(Debug, Default, PartialEq)]
pub(crate) struct MathText {
  pub text:   String,
  /// Byte ranges of `text` to render in italics.
  pub italic: Vec<Range<usize>>,
}

impl MathText {
  pub fn parse(source: &str) -> MathText {
    let mut out = MathText::default();

    for (i, segment) in split_math(source).into_iter().enumerate() {
      if i % 2 == 0 {
        out.push_plain(&segment);
      } else {
        match typeset(&segment) {
          Some(glyphs) => glyphs.into_iter().for_each(|(c, italic)| out.push(c, italic)),
          None => {
            tracing::warn!(math = %segment, "unsupported math, drawing it verbatim");
            segment.chars().for_each(|c| out.push(c, c.is_alphabetic()));
          }
        }
      }
    }

    out
  }

  fn push_plain(&mut self, s: &str) { self.text.push_str(s); }

  fn push(&mut self, c: char, italic: bool) {
    let start = self.text.len();
    self.text.push(c);
    let end = self.text.len();

    if !italic {
      return;
    }
    match self.italic.last_mut() {
      Some(last) if last.end == start => last.end = end,
      _ => self.italic.push(start..end),
    }
  }
}

/// Splits on unescaped `$`. Even indices are plain text, odd indices math. An
/// unmatched trailing `$` stays literal.
fn split_math(source: &str) -> Vec<String> {
  let mut segments = vec![];
  let mut current = String::new();
  let mut chars = source.chars().peekable();

  while let Some(c) = chars.next() {
    match c {
      '\\' if chars.peek() == Some(&'$') => {
        chars.next();
        current.push('$');
      }
      '$' => segments.push(std::mem::take(&mut current)),
      c => current.push(c),
    }
  }
  segments.push(current);

  if segments.len() % 2 == 0 {
    let open = segments.pop().unwrap_or_default();
    if let Some(last) = segments.last_mut() {
      last.push('$');
      last.push_str(&open);
    }
  }

  segments
}

fn typeset(math: &str) -> Option<Vec<(char, bool)>> {
  let storage = Storage::new();
  let mut glyphs = vec![];

  for event in Parser::new(math, &storage) {
    match event.ok()? {
      Event::Content(Content::Ordinary { content, .. }) => {
        glyphs.push((content, content.is_alphabetic()))
      }
      Event::Content(Content::Text(s) | Content::Number(s) | Content::Function(s)) => {
        glyphs.extend(s.chars().map(|c| (c, false)))
      }
      Event::Content(Content::BinaryOp { content, .. }) => {
        glyphs.extend([(' ', false), (content, false), (' ', false)])
      }
      Event::Content(Content::Punctuation(c)) => glyphs.push((c, false)),
      _ => return None,
    }
  }

  Some(glyphs)
}
