pub mod dispersion;
pub mod stability;
