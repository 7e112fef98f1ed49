mod walk;

pub use walk::{canonical_roots, discover_candidates};
