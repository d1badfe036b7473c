pub mod fqn;

pub use fqn::Fqn;
