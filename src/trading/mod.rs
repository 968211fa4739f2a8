pub mod deriv;
pub mod model;
pub mod normalizer;
pub mod services;
