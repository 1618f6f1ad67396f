/// Data layer: filename metadata, grouping, combination and statistics.
///
/// Architecture:
/// ```text
///   raw_data/*.txt
///        │
///        ▼
///   ┌──────────┐
///   │ filename  │  name → MeasurementId (or skipped)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ grouping  │  MeasurementIds → FileGroups by retained fields
///   └──────────┘
///        │
///        ├─────────────────────┐
///        ▼                     ▼
///   ┌──────────┐         ┌──────────┐
///   │ combine   │         │  stats    │  mean / std per
///   └──────────┘         └──────────┘  (chemistry, amplitude, frequency)
///   one 500k-1Hz file          │
///   per complete group         ▼
///                         ┌──────────┐
///                         │  filter   │  sidebar choices → traces
///                         └──────────┘
/// ```
pub mod combine;
pub mod error;
pub mod filename;
pub mod filter;
pub mod grouping;
pub mod loader;
pub mod model;
pub mod stats;
