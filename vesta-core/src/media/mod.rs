//! Media preview coordination.
//!
//! Clicking an embedded image or video opens a carousel scoped to that one
//! message's media; navigation wraps around and never leaks media from
//! other messages.

use serde::{Deserialize, Serialize};

use crate::markup::{media_refs, MediaKind, RenderNode};

/// One carousel item, lifted out of the message's parsed media nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub media: MediaKind,
    pub url: String,
    pub alt: String,
}

/// Carousel over one message's media references.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCarousel {
    items: Vec<MediaItem>,
    current: usize,
}

impl MediaCarousel {
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_item(&self) -> &MediaItem {
        &self.items[self.current]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Advance one item, wrapping past the end.
    pub fn next(&mut self) -> usize {
        self.current = (self.current + 1) % self.items.len();
        self.current
    }

    /// Step back one item, wrapping before the start.
    pub fn previous(&mut self) -> usize {
        self.current = (self.current + self.items.len() - 1) % self.items.len();
        self.current
    }
}

/// Holds the currently open carousel, if any.
#[derive(Debug, Default)]
pub struct MediaPreviewCoordinator {
    active: Option<MediaCarousel>,
}

impl MediaPreviewCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a carousel over the media of the clicked message, positioned at
    /// the clicked URL. Returns `None` (and stays closed) when the message
    /// has no media or the URL is not one of its media references.
    pub fn open_from_message(
        &mut self,
        message_text: &str,
        clicked_url: &str,
    ) -> Option<&MediaCarousel> {
        let items: Vec<MediaItem> = media_refs(message_text)
            .into_iter()
            .filter_map(|node| match node {
                RenderNode::MediaRef { media, url, alt } => Some(MediaItem { media, url, alt }),
                _ => None,
            })
            .collect();

        let current = items.iter().position(|item| item.url == clicked_url)?;
        self.active = Some(MediaCarousel { items, current });
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&MediaCarousel> {
        self.active.as_ref()
    }

    pub fn next(&mut self) -> Option<usize> {
        self.active.as_mut().map(MediaCarousel::next)
    }

    pub fn previous(&mut self) -> Option<usize> {
        self.active.as_mut().map(MediaCarousel::previous)
    }

    /// Escape key or outside click.
    pub fn close(&mut self) {
        self.active = None;
    }
}
