//! Line-level scanner splitting analysis text into prose lines and fenced segments.

/// One unit of analysis text, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    /// A line outside any fence.
    Prose(&'a str),
    /// A fenced segment.
    Fence(FencedSegment<'a>),
}

/// A fenced code segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedSegment<'a> {
    /// 1-based line number of the opening fence.
    pub line: usize,
    /// Text after the opening fence characters.
    pub info: &'a str,
    /// Body lines with the opening fence's indentation removed.
    pub body: Vec<&'a str>,
    /// `false` when the document ended before a closing fence.
    pub closed: bool,
}

struct Opening<'a> {
    marker: char,
    width: usize,
    indent: usize,
    info: &'a str,
}

/// Recognize an opening fence: three or more backticks or tildes.
fn opening_fence(line: &str) -> Option<Opening<'_>> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let width = trimmed.chars().take_while(|c| *c == marker).count();
    if width < 3 {
        return None;
    }
    let info = trimmed[width..].trim();
    // An inline span such as ```foo``` is not a fence.
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(Opening {
        marker,
        width,
        indent,
        info,
    })
}

fn closes(line: &str, marker: char, width: usize) -> bool {
    let trimmed = line.trim();
    let run = trimmed.chars().take_while(|c| *c == marker).count();
    run >= width && run == trimmed.chars().count()
}

/// Remove up to `indent` leading spaces from a body line.
fn dedent(line: &str, indent: usize) -> &str {
    let strip = line
        .bytes()
        .take(indent)
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &line[strip..]
}

/// Split `text` into prose lines and fenced segments.
pub fn scan(text: &str) -> Vec<Block<'_>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let Some(open) = opening_fence(line) else {
            blocks.push(Block::Prose(line));
            i += 1;
            continue;
        };

        let start = i;
        let mut body = Vec::new();
        let mut closed = false;
        i += 1;
        while i < lines.len() {
            if closes(lines[i], open.marker, open.width) {
                closed = true;
                i += 1;
                break;
            }
            body.push(dedent(lines[i], open.indent));
            i += 1;
        }

        blocks.push(Block::Fence(FencedSegment {
            line: start + 1,
            info: open.info,
            body,
            closed,
        }));
    }

    blocks
}
