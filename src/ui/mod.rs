mod colors;
mod footer;
mod header;
mod popup;
mod render;
mod table;

pub use render::render;
