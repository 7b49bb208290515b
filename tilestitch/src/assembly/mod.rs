//! Reassembly of fetched tiles into the output image.

mod canvas;
mod sink;

pub use canvas::Canvas;
pub use sink::ReassemblySink;
