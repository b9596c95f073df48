//! Text helpers shared by provider normalization, journal generation and the CLI.
//!
//! ```
//! use gazette::util::{capitalize, truncate_to_width};
//!
//! assert_eq!(capitalize("wisdom"), "Wisdom");
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod text;

pub use text::{
    capitalize, non_empty, strip_control_chars, strip_html_tags, truncate_to_width,
    truncate_words,
};
