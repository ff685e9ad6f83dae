//! Data layer: core types, loading, and windowing.
//!
//! Architecture:
//! ```text
//!  .csv / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  Vec<Fields>, column union
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  window   │  fixed-size chunks → Vec<Record>
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod window;
