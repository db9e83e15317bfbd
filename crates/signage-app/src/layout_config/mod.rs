//! The declarative layout file and the loaders built from it.
//!
//! A layout file is a tree of panels. Branch panels list `children`; leaf
//! panels carry one `content` block saying what fills them and where the
//! data comes from.

mod loaders;

use std::collections::BTreeMap;

use ::config::{Config, File, FileFormat};
use serde::Deserialize;
use signage_core::types::{DateRange, Orientation};
use signage_display::{LayoutNode, LayoutTree};

pub use loaders::{LoaderContext, PanelFeed};

use crate::error::{AppError, AppResult};

/// One panel of the layout file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelSpec {
    pub id: String,
    /// Element id of the page node the root panel is placed under. Only the
    /// root may name one.
    #[serde(default)]
    pub parent: Option<String>,
    /// Share of the parent along its flow direction, in percent.
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub css: BTreeMap<String, String>,
    #[serde(default)]
    pub orient: Option<Orientation>,
    #[serde(default)]
    pub children: Vec<PanelSpec>,
    #[serde(default)]
    pub content: Option<ContentSpec>,
}

/// What fills a leaf panel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentSpec {
    Video {
        #[serde(default = "default_video_path")]
        path: String,
        list: Vec<String>,
    },
    Menu {
        #[serde(default = "default_range")]
        range: DateRange,
        #[serde(default)]
        format: Option<String>,
    },
    Calendar {
        calendars: Vec<String>,
        #[serde(default = "default_range")]
        range: DateRange,
        #[serde(default)]
        format: Option<String>,
        #[serde(default)]
        presenter: PresenterKind,
    },
    Html {
        html: String,
    },
}

/// How fetched events are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenterKind {
    #[default]
    Table,
    Ticker,
    /// A ticker whose events are first enriched by the movie lookup.
    Movies,
}

fn default_video_path() -> String {
    String::from("videos/")
}

const fn default_range() -> DateRange {
    DateRange::Today
}

impl PanelSpec {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.content.is_some()
    }

    /// ## Summary
    /// Checks the shape rules the file format cannot express.
    ///
    /// ## Errors
    /// Returns an error if a panel has both or neither of `children` and
    /// `content`, if a panel below the root names a parent, or if a
    /// calendar panel lists no calendars.
    pub fn validate(&self) -> AppResult<()> {
        self.validate_at(true)
    }

    fn validate_at(&self, is_root: bool) -> AppResult<()> {
        if !is_root && self.parent.is_some() {
            return Err(AppError::InvalidLayout(format!(
                "panel '{}' names a parent but is not the root",
                self.id
            )));
        }
        match (&self.content, self.children.is_empty()) {
            (Some(_), false) => {
                return Err(AppError::InvalidLayout(format!(
                    "panel '{}' has both children and content",
                    self.id
                )));
            }
            (None, true) => {
                return Err(AppError::InvalidLayout(format!(
                    "panel '{}' has neither children nor content",
                    self.id
                )));
            }
            (Some(ContentSpec::Calendar { calendars, .. }), true) if calendars.is_empty() => {
                return Err(AppError::InvalidLayout(format!(
                    "calendar panel '{}' lists no calendars",
                    self.id
                )));
            }
            _ => {}
        }
        self.children
            .iter()
            .try_for_each(|child| child.validate_at(false))
    }
}

/// ## Summary
/// Loads and validates the layout file at `path`.
///
/// The format follows the file extension (JSON, TOML or YAML).
///
/// ## Errors
/// Returns an error if the file cannot be read or parsed, or if the layout
/// is malformed.
#[tracing::instrument]
pub fn load_layout(path: &str) -> AppResult<PanelSpec> {
    let spec = Config::builder()
        .add_source(File::with_name(path))
        .build()?
        .try_deserialize::<PanelSpec>()?;
    spec.validate()?;
    tracing::info!(root = %spec.id, "Layout file loaded");
    Ok(spec)
}

/// ## Summary
/// Parses and validates layout text in the given format.
///
/// ## Errors
/// Returns an error if the text cannot be parsed or the layout is
/// malformed.
pub fn parse_layout(text: &str, format: FileFormat) -> AppResult<PanelSpec> {
    let spec = Config::builder()
        .add_source(File::from_str(text, format))
        .build()?
        .try_deserialize::<PanelSpec>()?;
    spec.validate()?;
    Ok(spec)
}

/// ## Summary
/// Turns a layout file into a layout tree whose leaves load through `ctx`.
///
/// ## Errors
/// Returns an error if the layout is malformed or a panel's data source
/// cannot be set up.
pub fn build_layout(spec: &PanelSpec, ctx: &LoaderContext) -> AppResult<LayoutTree> {
    spec.validate()?;
    let root = build_node(spec, ctx)?;
    Ok(LayoutTree::new(root)?)
}

fn build_node(spec: &PanelSpec, ctx: &LoaderContext) -> AppResult<LayoutNode> {
    let mut node = match &spec.content {
        Some(content) => LayoutNode::with_loader(spec.id.clone(), ctx.loader(&spec.id, content)?),
        None => {
            let children = spec
                .children
                .iter()
                .map(|child| build_node(child, ctx))
                .collect::<AppResult<Vec<_>>>()?;
            LayoutNode::branch(spec.id.clone(), spec.orient, children)
        }
    };

    if let Some(parent) = &spec.parent {
        node = node.with_parent(parent.clone());
    }
    if let Some(size) = spec.size {
        node = node.with_size(size);
    }
    if let Some(title) = &spec.title {
        node = node.with_title(title.clone());
    }
    for (name, value) in &spec.css {
        node = node.with_style(name.clone(), value.clone());
    }
    Ok(node)
}
