//! Adapters Layer

pub mod svg;

pub use svg::render_svg;
