// Resume screening: session state, filtering, aggregation, rendering, exports.
// Remote work goes through crate::backend; nothing here talks HTTP directly.

pub mod aggregate;
pub mod filter;
pub mod handlers;
pub mod merge;
pub mod render;
pub mod session;
pub mod uploads;

/// Category names the page offers for exports and shortlisting.
pub const CATEGORY_CATALOGUE: [&str; 10] = [
    "Frontend",
    "Backend",
    "Full Stack",
    "Mobile",
    "AI/ML",
    "Testing",
    "Cloud",
    "DevOps",
    "HR",
    crate::models::record::UNCATEGORIZED,
];
