//! File-path marker recognition.
//!
//! Markers tie a fenced segment to a repository path. They come from three
//! places: the fence info string, a comment on the first line of the segment,
//! or a prose line preceding the segment.

use std::sync::LazyLock;

use regex::Regex;

/// Source-file extensions recognized as "path-like".
const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "pyi", "rs", "go", "java", "kt", "kts", "scala", "swift", "c", "h", "cc", "cpp", "cxx",
    "hpp", "hh", "cs", "fs", "rb", "php", "js", "jsx", "mjs", "cjs", "ts", "tsx", "vue", "svelte",
    "dart", "zig", "lua", "pl", "pm", "r", "jl", "ex", "exs", "erl", "hs", "ml", "clj", "sh",
    "bash", "zsh", "ps1", "sql", "html", "htm", "css", "scss", "sass", "less", "json", "toml",
    "yaml", "yml", "xml", "ini", "cfg", "conf", "md", "rst", "txt", "proto", "graphql", "tf",
    "hcl", "gradle", "cmake", "mk", "lock", "env",
];

/// Well-known files that carry no extension.
const BARE_FILE_NAMES: &[&str] = &[
    "Makefile",
    "Dockerfile",
    "Gemfile",
    "Rakefile",
    "Procfile",
    "Justfile",
    "LICENSE",
    "CODEOWNERS",
];

/// Fence languages and the extensions they are compatible with.
const LANGUAGE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("python", &["py", "pyi"]),
    ("py", &["py", "pyi"]),
    ("rust", &["rs"]),
    ("rs", &["rs"]),
    ("go", &["go"]),
    ("golang", &["go"]),
    ("java", &["java"]),
    ("kotlin", &["kt", "kts"]),
    ("scala", &["scala"]),
    ("swift", &["swift"]),
    ("c", &["c", "h"]),
    ("cpp", &["cc", "cpp", "cxx", "hpp", "hh", "h"]),
    ("c++", &["cc", "cpp", "cxx", "hpp", "hh", "h"]),
    ("csharp", &["cs"]),
    ("cs", &["cs"]),
    ("ruby", &["rb"]),
    ("rb", &["rb"]),
    ("php", &["php"]),
    ("javascript", &["js", "jsx", "mjs", "cjs"]),
    ("js", &["js", "jsx", "mjs", "cjs"]),
    ("jsx", &["jsx", "js"]),
    ("typescript", &["ts", "tsx"]),
    ("ts", &["ts", "tsx"]),
    ("tsx", &["tsx", "ts"]),
    ("bash", &["sh", "bash"]),
    ("sh", &["sh", "bash", "zsh"]),
    ("shell", &["sh", "bash", "zsh"]),
    ("zsh", &["zsh", "sh"]),
    ("console", &[]),
    ("shell-session", &[]),
    ("output", &[]),
    ("text", &["txt"]),
    ("plaintext", &["txt"]),
    ("sql", &["sql"]),
    ("html", &["html", "htm"]),
    ("css", &["css"]),
    ("json", &["json", "lock"]),
    ("toml", &["toml", "lock"]),
    ("yaml", &["yaml", "yml"]),
    ("yml", &["yaml", "yml"]),
    ("markdown", &["md"]),
    ("md", &["md"]),
    ("xml", &["xml"]),
];

/// Languages whose segments are never file content (they show a change, not a file).
const DIFF_LANGUAGES: &[&str] = &["diff", "patch", "udiff"];

/// Extensions for which a bare `---` line is content, not a before/after separator.
const DASH_SEPARATOR_EXEMPT: &[&str] = &["yaml", "yml", "md", "markdown", "rst"];

static ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:file|path|filename)\s*[:=]\s*[*_]*\s*[`'\x22]?([^\s`'\x22*]+)")
        .expect("annotation regex is valid")
});

static DECORATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`\s]+)`|\*\*([^*\s]+)\*\*").expect("decorated regex is valid")
});

static EMBEDDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:#|//|--|;|/\*|<!--)\s*(?:(?i:file|path|filename)\s*:\s*)?(\S+?)\s*(?:\*/|-->)?\s*$",
    )
    .expect("embedded marker regex is valid")
});

static EXPLICIT_EMBEDDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#|//|--|;|/\*|<!--)\s*(?i:file|path|filename)\s*:").expect("regex is valid")
});

static LINE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\d+(?::\d+)?$").expect("line suffix regex is valid"));

/// Outcome of looking for a marker in a prose line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProseMarker {
    /// Exactly one path named.
    Path(String),
    /// Several distinct paths named; the line cannot be attributed.
    Ambiguous(Vec<String>),
    None,
}

/// What a fence info string tells us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoString {
    pub language: Option<String>,
    pub path: Option<String>,
}

/// Lowercased extension of the final path segment, if any.
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() && !file_name.starts_with('.') {
        return None;
    }
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the path ends in a recognized source-file extension.
pub fn has_source_extension(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

fn is_bare_file_name(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    BARE_FILE_NAMES.contains(&file_name)
}

/// Strip surrounding punctuation and `:line[:col]` suffixes from a token.
fn clean_token(token: &str) -> &str {
    let trimmed = token
        .trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '"' | '\'' | ','))
        .trim_end_matches(['.', ';', ':', '!', '?']);
    match LINE_SUFFIX_RE.find(trimmed) {
        Some(m) => &trimmed[..m.start()],
        None => trimmed,
    }
}

fn is_url(token: &str) -> bool {
    token.contains("://") || token.starts_with("www.")
}

/// An explicitly annotated token may use any extension once it has a directory.
fn plausible_annotated_path(token: &str) -> bool {
    !is_url(token)
        && (has_source_extension(token)
            || is_bare_file_name(token)
            || (token.contains('/') && extension_of(token).is_some()))
}

/// Decorated tokens (backticks, bold) only need a recognized extension.
fn plausible_decorated_path(token: &str) -> bool {
    !is_url(token) && (has_source_extension(token) || is_bare_file_name(token))
}

/// Bare prose tokens need both a separator and a recognized extension.
fn plausible_bare_path(token: &str) -> bool {
    !is_url(token) && token.contains('/') && has_source_extension(token)
}

/// Find the single path a prose line refers to.
pub fn prose_marker(line: &str) -> ProseMarker {
    if let Some(caps) = ANNOTATION_RE.captures(line) {
        let token = clean_token(&caps[1]);
        if plausible_annotated_path(token) {
            return ProseMarker::Path(token.to_string());
        }
    }

    let mut found: Vec<String> = Vec::new();
    let mut push = |token: &str| {
        if !found.iter().any(|f| f == token) {
            found.push(token.to_string());
        }
    };

    for caps in DECORATED_RE.captures_iter(line) {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let token = clean_token(raw);
        if plausible_decorated_path(token) {
            push(token);
        }
    }

    let undecorated = DECORATED_RE.replace_all(line, " ");
    for raw in undecorated.split_whitespace() {
        let token = clean_token(raw);
        if plausible_bare_path(token) {
            push(token);
        }
    }

    match found.len() {
        0 => ProseMarker::None,
        1 => ProseMarker::Path(found.remove(0)),
        _ => ProseMarker::Ambiguous(found),
    }
}

/// Interpret a fence info string (`python`, `file: a.py`, `rust src/lib.rs`).
pub fn parse_info_string(info: &str) -> InfoString {
    let info = info.trim();
    if info.is_empty() {
        return InfoString::default();
    }

    if let Some(caps) = ANNOTATION_RE.captures(info) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
        let token = clean_token(&caps[1]);
        if whole == 0 || info[..whole].split_whitespace().count() <= 1 {
            let language = info[..whole]
                .split_whitespace()
                .next()
                .map(|l| l.trim_matches(['{', '.', ',']).to_ascii_lowercase());
            if plausible_annotated_path(token) {
                return InfoString {
                    language,
                    path: Some(token.to_string()),
                };
            }
        }
    }

    let mut language = None;
    let mut path = None;
    for (position, raw) in info.split_whitespace().enumerate() {
        let raw = raw.trim_matches(['{', '}']);
        let value = match raw.split_once('=') {
            Some((key, value)) => {
                let key = key.trim_start_matches('.').to_ascii_lowercase();
                if matches!(key.as_str(), "title" | "file" | "path" | "filename") {
                    value.trim_matches(['"', '\''])
                } else {
                    continue;
                }
            }
            None => raw,
        };
        let token = clean_token(value);
        if path.is_none() && plausible_decorated_path(token) {
            path = Some(token.to_string());
        } else if position == 0 && language.is_none() {
            language = Some(token.trim_start_matches('.').to_ascii_lowercase());
        }
    }

    InfoString { language, path }
}

/// Path named by a comment on the first line of a segment, if any.
pub fn embedded_marker(first_line: &str) -> Option<String> {
    let caps = EMBEDDED_RE.captures(first_line)?;
    let token = clean_token(&caps[1]);
    let explicit = EXPLICIT_EMBEDDED_RE.is_match(first_line);
    let accepted = if explicit {
        plausible_annotated_path(token)
    } else {
        plausible_decorated_path(token)
    };
    accepted.then(|| token.to_string())
}

/// A markdown ATX heading (`# Title`, `### Changes`).
pub fn is_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes)
        && trimmed[hashes..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
}

/// Whether a segment language denotes a diff rather than file content.
pub fn is_diff_language(language: &str) -> bool {
    DIFF_LANGUAGES.contains(&language)
}

/// Whether `language` contradicts the extension of `path`.
///
/// Unknown languages never contradict anything.
pub fn language_conflicts(language: &str, path: &str) -> bool {
    let Some((_, extensions)) = LANGUAGE_EXTENSIONS.iter().find(|(name, _)| *name == language)
    else {
        return false;
    };
    extension_of(path).is_some_and(|ext| !extensions.contains(&ext.as_str()))
}

/// Whether a bare `---` line separates before/after snippets for this path.
pub fn dash_separator_allowed(path: &str) -> bool {
    extension_of(path).is_none_or(|ext| !DASH_SEPARATOR_EXEMPT.contains(&ext.as_str()))
}
