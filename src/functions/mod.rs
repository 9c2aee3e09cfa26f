pub mod board;
pub mod render;
pub mod rotation;

pub use board::{build_board, sort_by_effective_time, Board, BoardQuery, QueryError, LINES_PER_PAGE};
pub use render::{render_page, BoardRow, RenderedPage};
pub use rotation::PageCursor;
