//! UrCare Vitals - classification, scoring, trend and streak engine for wellness trackers
//!
//! The engine turns raw wellness measurements into interpreted results through
//! small deterministic components: range classification → composite scoring →
//! trend analysis → streak tracking → report encoding.
//!
//! ## Modules
//!
//! - **Classification**: Map readings (BMI, blood pressure, glucose, symptom severity)
//!   onto named bands with alert levels
//! - **Scoring**: Weighted wellness and health scores with per-factor breakdowns
//! - **Trends and streaks**: Moving averages over reading series and daily habit streaks
//! - **Summaries**: Period-over-period changes, daily completion rates and weekly insights

pub mod classifier;
pub mod error;
pub mod medication;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod score;
pub mod store;
pub mod streak;
pub mod summary;
pub mod tables;
pub mod trend;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use classifier::{Band, BandTable, RangeClassifier};
pub use error::VitalsError;
pub use pipeline::{analyze_series_json, assess_reading_json, score_profile_json, VitalsProcessor};
pub use score::{compute_bmi, compute_score, CompositeScoreInput, HealthProfile, ScoreResult, WeightTable};
pub use store::{EntryStore, InMemoryEntryStore, ProfileProvider};
pub use streak::{is_at_milestone, next_milestone, Milestone, Streak, StreakBook, StreakTracker};
pub use summary::{daily_completion_rates, insights, period_change, summarize_completions, PeriodChange};
pub use trend::{Direction, TrendAnalyzer, TrendResult};
pub use types::{AlertLevel, Category, Reading, ReadingKind, ReadingValue};

/// Engine version embedded in all reports
pub const VITALS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "urcare-vitals";
