mod linear;
mod mlp;
mod module;

pub use linear::Linear;
pub use mlp::Mlp;
pub use module::Module;
