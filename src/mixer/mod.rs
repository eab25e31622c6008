pub(crate) mod config;
pub(crate) mod controller;
pub(crate) mod sync;
