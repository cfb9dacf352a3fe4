//! HTML rendering for site pages.
//!
//! All rendering uses [maud](https://maud.lambda.xyz/) for compile-time HTML
//! generation with automatic escaping of dynamic values. Markdown goes
//! through pulldown-cmark with every link and image target passed through
//! the URL safety filter first.

pub mod components;
pub mod markdown;
pub mod pages;
