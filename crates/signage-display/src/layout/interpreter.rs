use signage_core::constants::CONTENT_CLASS;
use signage_core::types::Orientation;

use crate::layout::node::{Content, LayoutNode, LayoutTree};
use crate::page::{NodeId, Page, PendingSize, format_number};

/// Where each panel of a tree ended up.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    /// Panel ids and their elements, in placement order.
    pub panels: Vec<(String, NodeId)>,
    /// Leaf panel ids in document order.
    pub leaves: Vec<String>,
}

impl Placement {
    #[must_use]
    pub fn panel(&self, id: &str) -> Option<NodeId> {
        self.panels
            .iter()
            .find(|(panel, _)| panel == id)
            .map(|(_, node)| *node)
    }
}

/// Leaf ids `load_data` must skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(Vec<String>);

impl Exclusions {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|excluded| excluded == id)
    }
}

impl From<&str> for Exclusions {
    fn from(id: &str) -> Self {
        Self(vec![id.to_string()])
    }
}

impl From<String> for Exclusions {
    fn from(id: String) -> Self {
        Self(vec![id])
    }
}

impl From<Vec<String>> for Exclusions {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

impl From<&[String]> for Exclusions {
    fn from(ids: &[String]) -> Self {
        Self(ids.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Exclusions {
    fn from(ids: [&str; N]) -> Self {
        Self(ids.iter().map(ToString::to_string).collect())
    }
}

fn count_as_f64(count: usize) -> f64 {
    u32::try_from(count).map_or(f64::from(u32::MAX), f64::from)
}

/// ## Summary
/// Builds the page structure for `tree` and resolves its sizes.
///
/// Placement runs first, in document order: every node becomes a `div` with
/// its id and style, titled nodes get an `h1`, leaves get a `div.content`
/// and branches the `hbox`/`vbox` class. Children of a horizontal branch are
/// given a pending width, children of a vertical one a pending height, worth
/// their `size` or an even share. The root gets a pending height only when
/// it declares a size. A root parent missing from the page is created under
/// `<body>`.
///
/// [`realize_sizes`] then turns every pending share into pixels.
#[tracing::instrument(skip_all, fields(root = %tree.root().id))]
pub fn interpret(page: &mut Page, tree: &LayoutTree) -> Placement {
    let root = tree.root();
    let parent_id = root.parent.as_deref().unwrap_or_default();
    let container = match page.element_by_id(parent_id) {
        Some(node) => node,
        None => {
            tracing::debug!(parent = parent_id, "Creating missing root parent");
            let body = page.body();
            let node = page.create_element("div");
            page.set_id(node, parent_id);
            page.append_child(body, node);
            node
        }
    };

    let mut placement = Placement::default();
    place(
        page,
        root,
        container,
        root.size.map(PendingSize::Height),
        &mut placement,
    );
    realize_sizes(page);

    tracing::debug!(
        panels = placement.panels.len(),
        leaves = placement.leaves.len(),
        "Layout interpreted"
    );
    placement
}

fn place(
    page: &mut Page,
    node: &LayoutNode,
    parent: NodeId,
    share: Option<PendingSize>,
    placement: &mut Placement,
) {
    let Some(element) = page.create_child(parent, "div") else {
        return;
    };
    page.set_id(element, &node.id);
    page.css(element, &node.style);

    match share {
        Some(PendingSize::Width(pct)) => {
            page.set_attr(element, "data-width", &format_number(pct));
            page.set_pending_size(element, PendingSize::Width(pct));
        }
        Some(PendingSize::Height(pct)) => {
            page.set_attr(element, "data-height", &format_number(pct));
            page.set_pending_size(element, PendingSize::Height(pct));
        }
        None => {}
    }

    if let Some(title) = &node.title
        && let Some(heading) = page.create_child(element, "h1")
    {
        page.set_text(heading, title);
    }
    placement.panels.push((node.id.clone(), element));

    match &node.content {
        Content::Leaf(_) => {
            if let Some(content) = page.create_child(element, "div") {
                page.add_class(content, CONTENT_CLASS);
            }
            placement.leaves.push(node.id.clone());
        }
        Content::Branch { children, .. } => {
            let orientation = node.orientation().unwrap_or(Orientation::Vertical);
            page.add_class(element, orientation.box_class());

            let even_share = 100.0 / count_as_f64(children.len());
            for child in children {
                let pct = child.size.unwrap_or(even_share);
                let share = match orientation {
                    Orientation::Horizontal => PendingSize::Width(pct),
                    Orientation::Vertical => PendingSize::Height(pct),
                };
                place(page, child, element, Some(share), placement);
            }
        }
    }
}

/// ## Summary
/// Converts every pending percentage on the page into pixels.
///
/// Runs in document order so a parent is sized before its children measure
/// it. A share becomes `pct / 100 * (parent content extent - 1)`.
pub fn realize_sizes(page: &mut Page) {
    for node in page.document_order() {
        let (Some(pending), Some(parent)) = (page.pending_size(node), page.parent(node)) else {
            continue;
        };
        match pending {
            PendingSize::Width(pct) => {
                let px = pct / 100.0 * (page.inner_width(parent) - 1.0);
                page.set_width(node, px.max(0.0));
            }
            PendingSize::Height(pct) => {
                let px = pct / 100.0 * (page.inner_height(parent) - 1.0);
                page.set_height(node, px.max(0.0));
            }
        }
    }
}

/// ## Summary
/// Invokes the loader of every leaf not in `exclude`, in document order.
///
/// Returns the ids of the leaves whose loaders ran.
pub fn load_data(tree: &LayoutTree, exclude: impl Into<Exclusions>) -> Vec<String> {
    let exclude = exclude.into();
    let mut loaded = Vec::new();
    for leaf in tree.leaves() {
        if exclude.contains(&leaf.id) {
            tracing::trace!(panel = %leaf.id, "Skipping excluded panel");
            continue;
        }
        if let Some(loader) = leaf.loader() {
            tracing::trace!(panel = %leaf.id, "Loading panel data");
            loader();
            loaded.push(leaf.id.clone());
        }
    }
    loaded
}
