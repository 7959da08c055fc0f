//! Configuration storage

mod xdg;

pub use xdg::XdgConfigStore;
