mod node;
mod parser;

pub use node::{BlockTag, EmphasisKind, MediaKind, RenderNode};
pub use parser::{media_refs, parse};
