//! Deriv 上游接入：线上负载结构、品种白名单、分类请求

pub mod deriv_api;
pub mod dto;
pub mod symbols;

pub use deriv_api::{AccountFeed, DerivApi};
