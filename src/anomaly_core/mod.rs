/// Detection core: discord search over series and outlier scoring over observations
pub mod discord;
pub mod knn;
pub mod mask;
pub mod merlin;
pub mod observation;
pub mod outlier;
pub mod subsequence;
pub mod threshold;

// Re-export commonly used types and entry points
pub use discord::DiscordCandidate;
pub use knn::ScoreAggregation;
pub use mask::AnomalyMask;
pub use merlin::{detect_discords, DiscordConfig, DiscordDetector, DiscordMaskMode, DiscordReport};
pub use observation::{Axis, ObservationMatrix};
pub use outlier::{detect_outliers, MissingPolicy, OutlierConfig, OutlierDetector, OutlierReport};
pub use subsequence::Subsequence;
pub use threshold::OutlierTail;
