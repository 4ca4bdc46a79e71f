//! HTTP handlers

pub mod health;
pub mod predict;
pub mod model_info;
pub mod form;

#[cfg(test)]
mod tests;
