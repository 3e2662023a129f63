pub mod library;
pub mod sphere;

pub use library::{Template, TemplateLibrary};
pub use sphere::{ball, dilate, Offset};
