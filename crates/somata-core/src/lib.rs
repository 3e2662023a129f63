pub mod classify;
pub mod consts;
pub mod correlate;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod io;
pub mod pipeline;
pub mod placement;
pub mod template;
