/// Data layer: file discovery, loading, caching, selection and export.
///
/// Architecture:
/// ```text
///   data/ (NFC or NFD names)
///        │
///        ▼
///   ┌──────────┐
///   │  locate   │  logical name → path (exact NFC, exact NFD, substring)
///   └──────────┘
///      │     │
///      ▼     ▼
///  ┌─────────────┐ ┌──────────┐
///  │ environment  │ │  growth   │  CSV per school / one sheet per school
///  └─────────────┘ └──────────┘
///        │     │
///        ▼     ▼
///   ┌──────────┐
///   │  cache    │  Snapshot (records + stats), reloaded when files change
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  school selection → combined tables → export
///   └──────────┘
/// ```

pub mod cache;
pub mod environment;
pub mod error;
pub mod export;
pub mod filter;
pub mod growth;
pub mod locate;
pub mod model;

#[cfg(test)]
pub mod test_utils;
