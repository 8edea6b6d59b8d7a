pub mod catalog;
pub mod client;
pub mod config;
pub mod fetch;
pub mod filings;
pub mod filter;
pub mod fundamentals;
pub mod groups;
pub mod mock;
pub mod news;
pub mod parser;
pub mod rate_limit;
pub mod screeners;
pub mod transport;

pub use client::FinvizClient;
pub use config::FinvizConfig;
pub use fetch::{Fetcher, RetryPolicy};
pub use filter::{compile, CompiledQuery, FilterRequest, Range, SortOrder};
pub use groups::Timeframe;
pub use parser::ParseOutcome;
pub use rate_limit::RateLimiter;
pub use screeners::{
    DividendGrowthParams, EarningsParams, EtfParams, PositiveSurpriseParams, RelativeVolumeParams, TechnicalParams,
    TrendReversionParams, UpcomingEarningsParams,
};
pub use transport::ReqwestTransport;
