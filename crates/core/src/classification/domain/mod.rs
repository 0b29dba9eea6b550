pub mod age_estimator;
pub mod tally;
