//! The display itself: an in-memory page, the layout interpreter that builds
//! it, and the tickers, presenters and video player that fill it.

pub mod display;
pub mod error;
pub mod layout;
pub mod page;
pub mod presenter;
pub mod ticker;
pub mod video;

pub use display::Display;
pub use error::{DisplayError, DisplayResult, LayoutError};
pub use layout::{Content, Exclusions, LayoutNode, LayoutTree, Loader, Placement};
pub use page::{Metrics, NodeId, Page, Selector, SharedPage, Viewport};
pub use presenter::Presenter;
pub use ticker::{Ticker, TickerOptions, TickerRegistry};
pub use video::{VideoOptions, VideoPlayer};
