use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use signage_core::types::Orientation;

use crate::error::LayoutError;

/// Data loader attached to a leaf panel, invoked on every data (re)load.
pub type Loader = Arc<dyn Fn() + Send + Sync>;

/// What a layout node holds: a loader, or child nodes stacked along an
/// orientation.
#[derive(Clone)]
pub enum Content {
    Leaf(Loader),
    Branch {
        children: Vec<LayoutNode>,
        orientation: Option<Orientation>,
    },
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(_) => f.write_str("Leaf(..)"),
            Self::Branch {
                children,
                orientation,
            } => f
                .debug_struct("Branch")
                .field("children", children)
                .field("orientation", orientation)
                .finish(),
        }
    }
}

/// A panel of the display.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    /// Element the root panel is placed under. Ignored on every other node.
    pub parent: Option<String>,
    pub content: Content,
    /// Share of the parent's extent, in percent.
    pub size: Option<f64>,
    pub title: Option<String>,
    /// Inline style overrides.
    pub style: BTreeMap<String, String>,
}

impl LayoutNode {
    #[must_use]
    pub fn leaf(id: impl Into<String>, loader: impl Fn() + Send + Sync + 'static) -> Self {
        Self::with_loader(id, Arc::new(loader))
    }

    #[must_use]
    pub fn with_loader(id: impl Into<String>, loader: Loader) -> Self {
        Self {
            id: id.into(),
            parent: None,
            content: Content::Leaf(loader),
            size: None,
            title: None,
            style: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn branch(
        id: impl Into<String>,
        orientation: Option<Orientation>,
        children: Vec<Self>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: None,
            content: Content::Branch {
                children,
                orientation,
            },
            size: None,
            title: None,
            style: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, Content::Leaf(_))
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        match &self.content {
            Content::Branch { children, .. } => children,
            Content::Leaf(_) => &[],
        }
    }

    #[must_use]
    pub fn loader(&self) -> Option<&Loader> {
        match &self.content {
            Content::Leaf(loader) => Some(loader),
            Content::Branch { .. } => None,
        }
    }

    /// Orientation children are stacked along.
    ///
    /// A branch with at most one child needs none declared and stacks
    /// vertically. Leaves have no orientation.
    #[must_use]
    pub fn orientation(&self) -> Option<Orientation> {
        match &self.content {
            Content::Branch { orientation, .. } => {
                Some(orientation.unwrap_or(Orientation::Vertical))
            }
            Content::Leaf(_) => None,
        }
    }
}

/// A validated layout tree.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    root: LayoutNode,
}

impl LayoutTree {
    /// ## Summary
    /// Validates `root` and wraps it.
    ///
    /// ## Errors
    /// Returns a [`LayoutError`] if the root names no parent, an id is empty
    /// or repeated, a branch with several children has no orientation, or a
    /// size lies outside 0-100.
    pub fn new(root: LayoutNode) -> Result<Self, LayoutError> {
        if root.parent.as_deref().is_none_or(str::is_empty) {
            return Err(LayoutError::MissingParent(root.id));
        }
        let mut seen = HashSet::new();
        validate(&root, &mut seen)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &LayoutNode {
        &self.root
    }

    /// Every node in document order.
    #[must_use]
    pub fn nodes(&self) -> Vec<&LayoutNode> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().iter().rev());
        }
        out
    }

    /// Leaf nodes in document order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&LayoutNode> {
        self.nodes().into_iter().filter(|n| n.is_leaf()).collect()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes().into_iter().find(|n| n.id == id)
    }
}

fn validate(node: &LayoutNode, seen: &mut HashSet<String>) -> Result<(), LayoutError> {
    if node.id.is_empty() {
        return Err(LayoutError::EmptyId);
    }
    if !seen.insert(node.id.clone()) {
        return Err(LayoutError::DuplicateId(node.id.clone()));
    }
    if let Some(size) = node.size
        && !(0.0..=100.0).contains(&size)
    {
        return Err(LayoutError::SizeOutOfRange {
            id: node.id.clone(),
            size,
        });
    }
    if let Content::Branch {
        children,
        orientation: None,
    } = &node.content
        && children.len() > 1
    {
        return Err(LayoutError::MissingOrientation(node.id.clone()));
    }

    node.children()
        .iter()
        .try_for_each(|child| validate(child, seen))
}
