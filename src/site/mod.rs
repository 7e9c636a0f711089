//! Site content: page table, maintenance banner, sitemap and robots.txt.

pub mod pages;
pub mod sitemap;

pub use pages::{Page, PAGES};
