//! Rich-text document model.
//!
//! A flat ordered sequence of nodes (HTML text runs and embedded images)
//! with a cursor. Every node carries a stable opaque `NodeId` assigned at
//! insertion, so an in-flight upload can find its placeholder later even
//! if the surrounding content has been edited; identity never relies on
//! position or on the `src` value.

use super::html;

/// Stable per-node identifier, unique within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A run of HTML markup between images.
    Text(String),
    /// An embedded image; `src` is a remote URL or an inline data URL.
    Image { src: String },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl Node {
    /// The image `src` if this node is an image.
    pub fn image_src(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Image { src } => Some(src),
            NodeKind::Text(_) => None,
        }
    }
}

/// The editor document: ordered nodes plus a cursor.
///
/// The cursor is a node index; `None` means no selection, in which case
/// insertions land at the document end.
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
    cursor: Option<usize>,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from stored HTML content. Image tags become Image
    /// nodes; everything between them becomes text runs.
    pub fn from_html(content: &str) -> Self {
        let mut doc = Self::new();
        for segment in html::split_segments(content) {
            match segment {
                html::Segment::Markup(text) => {
                    if !text.is_empty() {
                        doc.push_text(&text);
                    }
                }
                html::Segment::Image(src) => {
                    doc.push_node(NodeKind::Image { src });
                }
            }
        }
        doc
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.alloc_id();
        self.nodes.push(Node { id, kind });
        id
    }

    /// Append a text run at the document end.
    pub fn push_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Place the cursor, clamped to the node count.
    pub fn set_cursor(&mut self, index: Option<usize>) {
        self.cursor = index.map(|i| i.min(self.nodes.len()));
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    /// Insert an image at the cursor (document end when there is no
    /// selection) and advance the cursor past it.
    pub fn insert_image(&mut self, url: &str) -> NodeId {
        let index = self.cursor.unwrap_or(self.nodes.len()).min(self.nodes.len());
        let id = self.alloc_id();
        self.nodes.insert(
            index,
            Node {
                id,
                kind: NodeKind::Image {
                    src: url.to_string(),
                },
            },
        );
        self.cursor = Some(index + 1);
        id
    }

    /// Replace an existing image node with a fresh one carrying `url`,
    /// keeping its position and leaving the cursor just after it.
    ///
    /// When the node is gone (deleted while its upload was in flight, or
    /// the tree was rebuilt) this degrades to a plain insert rather than
    /// failing: losing the exact position is better than losing the image.
    pub fn replace_image(&mut self, id: NodeId, url: &str) -> NodeId {
        match self.position(id) {
            Some(index) => {
                self.nodes.remove(index);
                let new_id = self.alloc_id();
                self.nodes.insert(
                    index,
                    Node {
                        id: new_id,
                        kind: NodeKind::Image {
                            src: url.to_string(),
                        },
                    },
                );
                self.cursor = Some(index + 1);
                new_id
            }
            None => {
                log::warn!("Image node to replace no longer in document, inserting instead");
                self.insert_image(url)
            }
        }
    }

    /// Remove a node by id. No-op when absent.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(index) = self.position(id) {
            self.nodes.remove(index);
            if let Some(cursor) = self.cursor {
                if cursor > index {
                    self.cursor = Some(cursor - 1);
                }
            }
        }
    }

    /// Ordered `src` list of every image node, in document order. One
    /// entry per node: duplicate URLs on distinct nodes all appear.
    pub fn image_sources(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter_map(|node| node.image_src().map(str::to_string))
            .collect()
    }

    /// Image nodes whose `src` is still an inline data URL.
    pub fn data_url_images(&self) -> Vec<(NodeId, String)> {
        self.nodes
            .iter()
            .filter_map(|node| match node.image_src() {
                Some(src) if src.starts_with("data:") => Some((node.id, src.to_string())),
                _ => None,
            })
            .collect()
    }

    /// One-directional merge of a manually-edited URL list: URLs missing
    /// from the document are appended at the end; URLs already present
    /// are left exactly where they are, never duplicated or removed.
    pub fn merge_manual_urls(&mut self, urls: &[String]) -> usize {
        let mut added = 0;
        for url in urls {
            let url = url.trim();
            if url.is_empty() {
                continue;
            }
            let present = self
                .nodes
                .iter()
                .any(|node| node.image_src() == Some(url));
            if !present {
                self.push_node(NodeKind::Image {
                    src: url.to_string(),
                });
                added += 1;
            }
        }
        added
    }

    /// Serialize back to HTML: text runs as-is, images as `<img>` tags.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match &node.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Image { src } => {
                    out.push_str(&format!(r#"<img src="{}">"#, src));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_at_cursor_and_advance() {
        let mut doc = Document::new();
        doc.push_text("<p>before</p>");
        doc.push_text("<p>after</p>");
        doc.set_cursor(Some(1));

        doc.insert_image("https://x/a.png");
        assert_eq!(doc.cursor(), Some(2));
        assert_eq!(doc.image_sources(), vec!["https://x/a.png"]);
        assert!(matches!(doc.nodes()[1].kind, NodeKind::Image { .. }));
    }

    #[test]
    fn insert_without_selection_appends() {
        let mut doc = Document::new();
        doc.push_text("<p>text</p>");
        doc.insert_image("https://x/a.png");
        assert!(doc.nodes()[1].image_src().is_some());
        assert_eq!(doc.cursor(), Some(2));
    }

    #[test]
    fn replace_keeps_position_and_mints_new_id() {
        let mut doc = Document::new();
        doc.push_text("<p>a</p>");
        let id = doc.insert_image("data:image/png;base64,AAAA");
        doc.push_text("<p>b</p>");

        let new_id = doc.replace_image(id, "https://x/a.png");
        assert_ne!(new_id, id);
        assert!(!doc.contains(id));
        assert_eq!(doc.nodes()[1].image_src(), Some("https://x/a.png"));
        assert_eq!(doc.cursor(), Some(2));
    }

    #[test]
    fn replace_missing_node_falls_back_to_insert() {
        let mut doc = Document::new();
        let id = doc.insert_image("data:image/png;base64,AAAA");
        doc.remove(id);
        assert!(doc.is_empty());

        doc.replace_image(id, "https://x/a.png");
        assert_eq!(doc.image_sources(), vec!["https://x/a.png"]);
    }

    #[test]
    fn image_sources_keep_duplicates_on_distinct_nodes() {
        let mut doc = Document::new();
        doc.insert_image("https://x/same.png");
        doc.insert_image("https://x/same.png");
        assert_eq!(doc.image_sources().len(), 2);
    }

    #[test]
    fn merge_manual_urls_appends_only_missing() {
        let mut doc = Document::new();
        doc.insert_image("https://x/old.jpg");

        let added = doc.merge_manual_urls(&[
            "https://x/old.jpg".to_string(),
            "https://y/new.jpg".to_string(),
            "  ".to_string(),
        ]);

        assert_eq!(added, 1);
        assert_eq!(
            doc.image_sources(),
            vec!["https://x/old.jpg", "https://y/new.jpg"]
        );
    }

    #[test]
    fn from_html_round_trips_images() {
        let doc = Document::from_html(r#"<p>car</p><img src="https://x/a.png"><p>end</p>"#);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.image_sources(), vec!["https://x/a.png"]);
        assert_eq!(
            doc.to_html(),
            r#"<p>car</p><img src="https://x/a.png"><p>end</p>"#
        );
    }

    #[test]
    fn data_url_images_ignores_remote() {
        let mut doc = Document::new();
        doc.insert_image("https://x/a.png");
        let pending = doc.insert_image("data:image/png;base64,AAAA");
        let found = doc.data_url_images();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, pending);
    }

    #[test]
    fn remove_adjusts_cursor() {
        let mut doc = Document::new();
        let first = doc.insert_image("https://x/a.png");
        doc.insert_image("https://x/b.png");
        assert_eq!(doc.cursor(), Some(2));

        doc.remove(first);
        assert_eq!(doc.cursor(), Some(1));
    }
}
