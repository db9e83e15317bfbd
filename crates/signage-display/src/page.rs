//! In-memory page document.
//!
//! An arena of nodes rooted at `<body>`. Elements carry the handful of
//! attributes the layout needs; panel content arrives as opaque HTML
//! fragments. Sizes are resolved against a fixed viewport instead of a
//! rendering engine: an element without an explicit extent stretches to its
//! parent's inner extent.
//!
//! Node handles are generational. After [`Page::reset`] every handle taken
//! before is stale and every operation on it is a no-op, which is what keeps
//! late loaders and old tickers harmless across a full reload.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use signage_core::constants::{CLIP_END_SCRIPT, CONTENT_CLASS, VIDEO_ELEMENT_ID};
use signage_format::html::escape;

use crate::error::DisplayError;

const BASE_STYLE: &str = "html, body { margin: 0; overflow: hidden; } \
     .hbox { display: flex; flex-direction: row; } \
     .vbox { display: flex; flex-direction: column; } \
     .ticker .item { transition: opacity 0.4s; } \
     table { width: 100%; }";

/// Handle to a node of a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Size of the surface the page is laid out on, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Font-derived measurements the layout needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Outer height of a panel title (`<h1>`).
    pub heading_height: f64,
    /// Pixels per `em`.
    pub font_size: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            heading_height: 40.0,
            font_size: 16.0,
        }
    }
}

/// Percentage share an element is waiting to have turned into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingSize {
    Width(f64),
    Height(f64),
}

/// Padding of an element, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    #[must_use]
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    #[must_use]
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

/// A `#id` or `#id .class` selector.
///
/// `#id .class` resolves to the first descendant of `#id`, in document
/// order, carrying `class`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    id: String,
    class: Option<String>,
}

impl Selector {
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: None,
        }
    }

    /// The content area of the panel `id`.
    #[must_use]
    pub fn content_of(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: Some(CONTENT_CLASS.to_string()),
        }
    }

    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }
}

impl FromStr for Selector {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DisplayError::InvalidSelector(s.to_string());
        let mut parts = s.split_whitespace();

        let id = parts
            .next()
            .and_then(|part| part.strip_prefix('#'))
            .filter(|id| !id.is_empty())
            .ok_or_else(invalid)?;
        let class = match parts.next() {
            None => None,
            Some(part) => Some(
                part.strip_prefix('.')
                    .filter(|class| !class.is_empty())
                    .ok_or_else(invalid)?
                    .to_string(),
            ),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            id: id.to_string(),
            class,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class {
            Some(class) => write!(f, "#{} .{class}", self.id),
            None => write!(f, "#{}", self.id),
        }
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: &'static str,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    pending: Option<PendingSize>,
    width: Option<f64>,
    height: Option<f64>,
    media_height: Option<f64>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            style: BTreeMap::new(),
            pending: None,
            width: None,
            height: None,
            media_height: None,
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(Element),
    Text(String),
    Html { html: String, visible: bool },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The page document.
#[derive(Debug)]
pub struct Page {
    nodes: Vec<Node>,
    generation: u32,
    viewport: Viewport,
    metrics: Metrics,
}

impl Page {
    #[must_use]
    pub fn new(viewport: Viewport, metrics: Metrics) -> Self {
        Self {
            nodes: vec![Self::body_node()],
            generation: 0,
            viewport,
            metrics,
        }
    }

    fn body_node() -> Node {
        Node {
            kind: NodeKind::Element(Element::new("body")),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Drops every node but a fresh `<body>`. All earlier handles go stale.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.nodes = vec![Self::body_node()];
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: self.generation,
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get_mut(id.index)
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId {
            index: self.nodes.len() - 1,
            generation: self.generation,
        }
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &'static str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    /// Creates an element and appends it to `parent`.
    ///
    /// Returns `None`, creating nothing reachable, when `parent` is stale or
    /// not an element.
    pub fn create_child(&mut self, parent: NodeId, tag: &'static str) -> Option<NodeId> {
        self.element(parent)?;
        let child = self.create_element(tag);
        self.append_child(parent, child);
        Some(child)
    }

    /// Moves `child` to the end of `parent`'s children.
    ///
    /// Ignored when either node is stale, `parent` is not an element, or the
    /// move would make a node its own ancestor.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.element(parent).is_none() || self.node(child).is_none() {
            return;
        }
        if self.ancestors_inclusive(parent).contains(&child) {
            return;
        }

        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    /// Removes `node` from its parent, leaving it detached.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|c| *c != node);
        }
        if let Some(node) = self.node_mut(node) {
            node.parent = None;
        }
    }

    /// Detaches every child of `node`.
    pub fn clear(&mut self, node: NodeId) {
        let Some(target) = self.node_mut(node) else {
            return;
        };
        let children = std::mem::take(&mut target.children);
        for child in children {
            if let Some(child) = self.node_mut(child) {
                child.parent = None;
            }
        }
    }

    /// Replaces the children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if self.element(node).is_none() {
            return;
        }
        self.clear(node);
        let text = self.push(NodeKind::Text(text.to_string()));
        self.append_child(node, text);
    }

    /// Replaces the children of `node` with a single HTML fragment.
    pub fn set_html(&mut self, node: NodeId, html: &str) -> Option<NodeId> {
        self.element(node)?;
        self.clear(node);
        self.append_html(node, html)
    }

    /// Appends a visible HTML fragment to `node`.
    pub fn append_html(&mut self, node: NodeId, html: &str) -> Option<NodeId> {
        self.element(node)?;
        let fragment = self.push(NodeKind::Html {
            html: html.to_string(),
            visible: true,
        });
        self.append_child(node, fragment);
        Some(fragment)
    }

    /// Shows or hides an HTML fragment. Elements are always visible.
    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(Node {
            kind: NodeKind::Html { visible: v, .. },
            ..
        }) = self.node_mut(node)
        {
            *v = visible;
        }
    }

    #[must_use]
    pub fn is_visible(&self, node: NodeId) -> bool {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Html { visible, .. }) => *visible,
            Some(_) => true,
            None => false,
        }
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        if let Some(element) = self.element_mut(node) {
            element.id = Some(id.to_string());
        }
    }

    #[must_use]
    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.element(node)?.id.as_deref()
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&'static str> {
        self.element(node).map(|e| e.tag)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node)
            && !element.classes.iter().any(|c| c == class)
        {
            element.classes.push(class.to_string());
        }
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attrs.insert(name.to_string(), value.to_string());
        }
    }

    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attrs.get(name).map(String::as_str)
    }

    /// Merges inline style properties into `node`.
    pub fn css(&mut self, node: NodeId, properties: &BTreeMap<String, String>) {
        if let Some(element) = self.element_mut(node) {
            for (name, value) in properties {
                element.style.insert(name.clone(), value.clone());
            }
        }
    }

    pub fn set_style(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.style.insert(name.to_string(), value.to_string());
        }
    }

    #[must_use]
    pub fn style(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.style.get(name).map(String::as_str)
    }

    pub fn set_pending_size(&mut self, node: NodeId, pending: PendingSize) {
        if let Some(element) = self.element_mut(node) {
            element.pending = Some(pending);
        }
    }

    #[must_use]
    pub fn pending_size(&self, node: NodeId) -> Option<PendingSize> {
        self.element(node)?.pending
    }

    /// Sets an explicit content width in pixels.
    pub fn set_width(&mut self, node: NodeId, px: f64) {
        if let Some(element) = self.element_mut(node) {
            element.width = Some(px);
        }
    }

    /// Sets an explicit content height in pixels.
    pub fn set_height(&mut self, node: NodeId, px: f64) {
        if let Some(element) = self.element_mut(node) {
            element.height = Some(px);
        }
    }

    #[must_use]
    pub fn explicit_width(&self, node: NodeId) -> Option<f64> {
        self.element(node)?.width
    }

    #[must_use]
    pub fn explicit_height(&self, node: NodeId) -> Option<f64> {
        self.element(node)?.height
    }

    /// Height every image directly inside `node` is rendered with.
    pub fn set_media_height(&mut self, node: NodeId, px: f64) {
        if let Some(element) = self.element_mut(node) {
            element.media_height = Some(px);
        }
    }

    #[must_use]
    pub fn media_height(&self, node: NodeId) -> Option<f64> {
        self.element(node)?.media_height
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match self.node(node) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Children of `node`'s parent other than `node` itself.
    #[must_use]
    pub fn siblings(&self, node: NodeId) -> Vec<NodeId> {
        self.parent(node)
            .map(|parent| {
                self.children(parent)
                    .iter()
                    .copied()
                    .filter(|c| *c != node)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn ancestors_inclusive(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = self.parent(id);
        }
        chain
    }

    /// Whether `node` is reachable from `<body>`.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.ancestors_inclusive(node).contains(&self.body())
    }

    /// Descendants of `node` in document order, `node` excluded.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Every attached node in document order, starting at `<body>`.
    #[must_use]
    pub fn document_order(&self) -> Vec<NodeId> {
        let body = self.body();
        let mut order = vec![body];
        order.extend(self.descendants(body));
        order
    }

    /// First attached element with the given id.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|node| self.element_id(*node) == Some(id))
    }

    /// Resolves a selector against the attached document.
    #[must_use]
    pub fn select(&self, selector: &Selector) -> Option<NodeId> {
        let root = self.element_by_id(selector.element_id())?;
        match selector.class() {
            None => Some(root),
            Some(class) => self
                .descendants(root)
                .into_iter()
                .find(|node| self.has_class(*node, class)),
        }
    }

    /// Padding of `node` as given by its inline style.
    #[must_use]
    pub fn padding(&self, node: NodeId) -> Edges {
        self.element(node)
            .map(|e| padding_from_style(&e.style, self.metrics.font_size))
            .unwrap_or_default()
    }

    /// Content width of `node`.
    #[must_use]
    pub fn inner_width(&self, node: NodeId) -> f64 {
        if node == self.body() {
            return self.viewport.width;
        }
        let Some(element) = self.element(node) else {
            return 0.0;
        };
        if let Some(width) = element.width {
            return width;
        }
        let padding = self.padding(node).horizontal();
        self.parent(node)
            .map_or(0.0, |parent| (self.inner_width(parent) - padding).max(0.0))
    }

    /// Content height of `node`.
    #[must_use]
    pub fn inner_height(&self, node: NodeId) -> f64 {
        if node == self.body() {
            return self.viewport.height;
        }
        let Some(element) = self.element(node) else {
            return 0.0;
        };
        if let Some(height) = element.height {
            return height;
        }
        let padding = self.padding(node).vertical();
        if element.tag == "h1" {
            return (self.metrics.heading_height - padding).max(0.0);
        }
        self.parent(node)
            .map_or(0.0, |parent| (self.inner_height(parent) - padding).max(0.0))
    }

    /// Content width plus horizontal padding.
    #[must_use]
    pub fn outer_width(&self, node: NodeId) -> f64 {
        if self.element(node).is_none() {
            return 0.0;
        }
        self.inner_width(node) + self.padding(node).horizontal()
    }

    /// Content height plus vertical padding.
    #[must_use]
    pub fn outer_height(&self, node: NodeId) -> f64 {
        if self.element(node).is_none() {
            return 0.0;
        }
        self.inner_height(node) + self.padding(node).vertical()
    }

    /// Serialized children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serialized `<body>` element.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_node(self.body(), &mut out);
        out
    }

    /// Serialized page, ready to be served.
    ///
    /// With a non-zero `refresh_secs` the page asks the browser to reload it
    /// after that many seconds. A page with a video player also carries the
    /// script that reports each clip end back to the server.
    #[must_use]
    pub fn render_document(&self, refresh_secs: u32) -> String {
        let mut html = String::from(
            "<!DOCTYPE html><html><head><meta charset='utf-8' /><title>Signage</title>",
        );
        if refresh_secs > 0 {
            html.push_str("<meta http-equiv='refresh' content='");
            html.push_str(&refresh_secs.to_string());
            html.push_str("' />");
        }
        html.push_str("<style>");
        html.push_str(BASE_STYLE);
        html.push_str("</style></head>");
        html.push_str(&self.render());
        if self.element_by_id(VIDEO_ELEMENT_ID).is_some() {
            html.push_str("<script>");
            html.push_str(CLIP_END_SCRIPT);
            html.push_str("</script>");
        }
        html.push_str("</html>");
        html
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(element.tag);
                if let Some(id) = &element.id {
                    push_attr(out, "id", id);
                }
                if !element.classes.is_empty() {
                    push_attr(out, "class", &element.classes.join(" "));
                }
                for (name, value) in &element.attrs {
                    push_attr(out, name, value);
                }
                let style = style_text(element);
                if !style.is_empty() {
                    push_attr(out, "style", &style);
                }
                out.push('>');
                for child in &node.children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(element.tag);
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Html { html, visible } => {
                let media = node.parent.and_then(|p| self.media_height(p));
                let html = match media {
                    Some(px) => Cow::Owned(html.replace(
                        "<img ",
                        &format!("<img style='height: {}px' ", format_number(px)),
                    )),
                    None => Cow::Borrowed(html.as_str()),
                };
                if *visible {
                    out.push_str(&html);
                } else {
                    out.push_str("<div style='display: none'>");
                    out.push_str(&html);
                    out.push_str("</div>");
                }
            }
        }
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("='");
    out.push_str(&escape(value));
    out.push('\'');
}

fn style_text(element: &Element) -> String {
    let mut style = element.style.clone();
    if let Some(width) = element.width {
        style.insert("width".to_string(), format!("{}px", format_number(width)));
    }
    if let Some(height) = element.height {
        style.insert("height".to_string(), format!("{}px", format_number(height)));
    }
    style
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Formats a pixel or percentage value with at most two decimals.
#[must_use]
pub fn format_number(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn parse_length(value: &str, font_size: f64) -> f64 {
    let value = value.trim();
    let parsed = if let Some(n) = value.strip_suffix("px") {
        n.trim().parse::<f64>().ok()
    } else if let Some(n) = value
        .strip_suffix("rem")
        .or_else(|| value.strip_suffix("em"))
    {
        n.trim().parse::<f64>().ok().map(|n| n * font_size)
    } else {
        value.parse::<f64>().ok()
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn padding_from_style(style: &BTreeMap<String, String>, font_size: f64) -> Edges {
    let mut edges = Edges::default();

    if let Some(shorthand) = style.get("padding") {
        let values: Vec<f64> = shorthand
            .split_whitespace()
            .map(|v| parse_length(v, font_size))
            .collect();
        match values.as_slice() {
            [all] => {
                edges = Edges {
                    top: *all,
                    right: *all,
                    bottom: *all,
                    left: *all,
                };
            }
            [vertical, horizontal] => {
                edges = Edges {
                    top: *vertical,
                    right: *horizontal,
                    bottom: *vertical,
                    left: *horizontal,
                };
            }
            [top, horizontal, bottom] => {
                edges = Edges {
                    top: *top,
                    right: *horizontal,
                    bottom: *bottom,
                    left: *horizontal,
                };
            }
            [top, right, bottom, left, ..] => {
                edges = Edges {
                    top: *top,
                    right: *right,
                    bottom: *bottom,
                    left: *left,
                };
            }
            [] => {}
        }
    }

    for (name, edge) in [
        ("padding-top", &mut edges.top),
        ("padding-right", &mut edges.right),
        ("padding-bottom", &mut edges.bottom),
        ("padding-left", &mut edges.left),
    ] {
        if let Some(value) = style.get(name) {
            *edge = parse_length(value, font_size);
        }
    }

    edges
}

/// A page shared between the interpreter, presenters, tickers and the
/// HTTP surface.
#[derive(Debug, Clone)]
pub struct SharedPage(Arc<Mutex<Page>>);

impl SharedPage {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self(Arc::new(Mutex::new(page)))
    }

    /// Runs `f` with exclusive access to the page.
    ///
    /// A panic in an earlier holder does not leave the page unusable: every
    /// mutation is a single step, so the data behind a poisoned lock is
    /// still consistent.
    pub fn with<R>(&self, f: impl FnOnce(&mut Page) -> R) -> R {
        let mut page = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut page)
    }

    #[must_use]
    pub fn render_document(&self, refresh_secs: u32) -> String {
        self.with(|page| page.render_document(refresh_secs))
    }
}
