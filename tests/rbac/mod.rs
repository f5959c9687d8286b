pub mod support;

mod config;
mod errors;
mod hardening;
mod http;
mod tokens;
