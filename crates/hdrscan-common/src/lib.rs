//! hdrscan-common: shared types and lookup tables.
//!
//! - **Dynamic-range types**: [`HdrFormat`], [`EnhancementLayer`] and the
//!   [`HdrClassification`] produced for every scanned file
//! - **Language tables**: ISO code variants used for track selection
//! - **Path utilities**: supported video extensions
//!
//! # Examples
//!
//! ```
//! use hdrscan_common::{language, paths::is_video_file, HdrClassification};
//! use std::path::Path;
//!
//! assert!(is_video_file(Path::new("movie.mkv")));
//! assert!(language::matches("de", "GER"));
//! assert_eq!(HdrClassification::sdr().detail, "SDR");
//! ```

pub mod language;
pub mod paths;
pub mod types;

pub use types::*;
