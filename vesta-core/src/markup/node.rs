use serde::{Deserialize, Serialize};

/// Inline emphasis weight, in descending marker priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmphasisKind {
    Bold,
    Italic,
    BoldItalic,
}

/// Embedded media flavor, inferred from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Whitelisted key-value bracket tags. `CHOICES` is not listed here because
/// its content is an option list, not a field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockTag {
    Property,
    Contact,
    Schedule,
}

impl BlockTag {
    pub fn name(&self) -> &'static str {
        match self {
            BlockTag::Property => "PROPERTY",
            BlockTag::Contact => "CONTACT",
            BlockTag::Schedule => "SCHEDULE",
        }
    }
}

/// One renderable unit of assistant reply text.
///
/// Nodes are a pure function of the input string; they are derived per
/// render and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
    PlainText { text: String },
    Emphasis { style: EmphasisKind, text: String },
    ListItem { text: String },
    Divider,
    Hyperlink { text: String, url: String },
    MediaRef {
        media: MediaKind,
        url: String,
        alt: String,
    },
    ChoiceSet { options: Vec<String> },
    KeyValueBlock {
        tag: BlockTag,
        fields: Vec<(String, String)>,
    },
}

impl RenderNode {
    pub fn plain(text: impl Into<String>) -> Self {
        RenderNode::PlainText { text: text.into() }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, RenderNode::MediaRef { .. })
    }
}
