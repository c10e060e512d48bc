pub mod context;
pub mod derived;
pub mod engine;
pub mod matchers;
pub mod outcome;

pub use derived::check_derived;
pub use engine::{MatcherRegistry, Reconciler};
pub use outcome::{CheckStatus, DerivedMetrics, MetricCheck, QcReport, Status, Summary, Verdict};
