//! Grid and text layout: turns a [`Matrix`](crate::model::Matrix) into
//! pre-rendered [`Block`](crate::model::Block)s.

mod grid;
mod text;

pub use grid::{ColumnLayout, GridLayout, GridSettings, LayoutCache};
pub use text::{FlowLine, FlowResult, TextBox, TextFlow, TextParams, layout_text};
