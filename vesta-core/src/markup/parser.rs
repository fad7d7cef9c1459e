//! Mini-markup tokenizer for assistant reply text.
//!
//! Assistant replies embed a small bracket-tag vocabulary (`[CHOICES]`,
//! `[PROPERTY]`, ...) plus markdown-style media, links, emphasis, bullets
//! and dividers inside otherwise plain text. `parse` turns one reply string
//! into an ordered node sequence. The function is total: any input is valid,
//! and anything unrecognized passes through as plain text. Unterminated tags
//! stay literal, which also covers partial arrival while a reply is still
//! streaming token by token.

use std::sync::LazyLock;

use regex::Regex;

use super::node::{BlockTag, EmphasisKind, MediaKind, RenderNode};

// Branch order is the match priority at equal positions: bracket-tag blocks,
// then media-markdown, then hyperlinks. Tags are spelled out per branch
// because the regex engine has no backreferences; a mismatched or missing
// closing tag simply never matches.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\[CHOICES\](?P<choices>.*?)\[/CHOICES\]|\[PROPERTY\](?P<property>.*?)\[/PROPERTY\]|\[CONTACT\](?P<contact>.*?)\[/CONTACT\]|\[SCHEDULE\](?P<schedule>.*?)\[/SCHEDULE\]|!\[(?P<media_alt>[^\]]*)\]\((?P<media_url>[^)\s]+)\)|\[(?P<link_text>[^\]]+)\]\((?P<link_url>[^)\s]+)\)",
    )
    .expect("token pattern must compile")
});

// Inline emphasis, priority: *** > ** > _ > *; bodies are non-greedy so the
// nearest closing marker wins.
static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*\*(?P<bold_italic>.+?)\*\*\*|\*\*(?P<bold>.+?)\*\*|_(?P<underscore>.+?)_|\*(?P<italic>.+?)\*")
        .expect("emphasis pattern must compile")
});

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".m4v"];

/// Parse one reply string into renderable nodes. Pure and idempotent.
pub fn parse(text: &str) -> Vec<RenderNode> {
    let mut nodes = Vec::new();
    let mut cursor = 0;

    for caps in TOKEN_RE.captures_iter(text) {
        let matched = caps.get(0).expect("match 0 always present");
        if matched.start() > cursor {
            parse_literal_run(&text[cursor..matched.start()], &mut nodes);
        }

        if let Some(body) = caps.name("choices") {
            nodes.push(choice_set(body.as_str()));
        } else if let Some(body) = caps.name("property") {
            nodes.push(key_value_block(BlockTag::Property, body.as_str()));
        } else if let Some(body) = caps.name("contact") {
            nodes.push(key_value_block(BlockTag::Contact, body.as_str()));
        } else if let Some(body) = caps.name("schedule") {
            nodes.push(key_value_block(BlockTag::Schedule, body.as_str()));
        } else if let Some(url) = caps.name("media_url") {
            let alt = caps.name("media_alt").map(|m| m.as_str()).unwrap_or("");
            nodes.push(RenderNode::MediaRef {
                media: media_kind(url.as_str()),
                url: url.as_str().to_string(),
                alt: alt.to_string(),
            });
        } else if let (Some(link_text), Some(link_url)) =
            (caps.name("link_text"), caps.name("link_url"))
        {
            nodes.push(RenderNode::Hyperlink {
                text: link_text.as_str().to_string(),
                url: link_url.as_str().to_string(),
            });
        }

        cursor = matched.end();
    }

    if cursor < text.len() {
        parse_literal_run(&text[cursor..], &mut nodes);
    }

    nodes
}

/// Scan a literal run line by line: dividers, list items, inline emphasis.
/// Consecutive plain segments (including their newlines) collapse into a
/// single `PlainText` node.
fn parse_literal_run(run: &str, nodes: &mut Vec<RenderNode>) {
    let mut plain = String::new();

    for line in run.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        let trimmed = body.trim();

        if trimmed == "---" {
            flush_plain(&mut plain, nodes);
            nodes.push(RenderNode::Divider);
            continue;
        }

        if let Some(item) = bullet_text(trimmed) {
            flush_plain(&mut plain, nodes);
            nodes.push(RenderNode::ListItem {
                text: item.to_string(),
            });
            continue;
        }

        parse_inline_emphasis(body, &mut plain, nodes);
        plain.push_str(newline);
    }

    flush_plain(&mut plain, nodes);
}

fn flush_plain(plain: &mut String, nodes: &mut Vec<RenderNode>) {
    if !plain.is_empty() {
        nodes.push(RenderNode::plain(std::mem::take(plain)));
    }
}

fn bullet_text(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("\u{2022} "))
        .map(str::trim)
}

fn parse_inline_emphasis(line: &str, plain: &mut String, nodes: &mut Vec<RenderNode>) {
    let mut cursor = 0;

    for caps in EMPHASIS_RE.captures_iter(line) {
        let matched = caps.get(0).expect("match 0 always present");
        plain.push_str(&line[cursor..matched.start()]);
        flush_plain(plain, nodes);

        let (style, body) = if let Some(body) = caps.name("bold_italic") {
            (EmphasisKind::BoldItalic, body)
        } else if let Some(body) = caps.name("bold") {
            (EmphasisKind::Bold, body)
        } else if let Some(body) = caps.name("underscore") {
            (EmphasisKind::Italic, body)
        } else {
            (
                EmphasisKind::Italic,
                caps.name("italic").expect("one branch always captures"),
            )
        };
        nodes.push(RenderNode::Emphasis {
            style,
            text: body.as_str().to_string(),
        });

        cursor = matched.end();
    }

    plain.push_str(&line[cursor..]);
}

fn choice_set(body: &str) -> RenderNode {
    let options = body
        .split('|')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect();
    RenderNode::ChoiceSet { options }
}

fn key_value_block(tag: BlockTag, body: &str) -> RenderNode {
    let fields = body
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect();
    RenderNode::KeyValueBlock { tag, fields }
}

fn media_kind(url: &str) -> MediaKind {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// Collect the media references of one message, in order.
pub fn media_refs(text: &str) -> Vec<RenderNode> {
    parse(text).into_iter().filter(RenderNode::is_media).collect()
}
