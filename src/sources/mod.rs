pub mod dataset_fetcher;

pub use dataset_fetcher::DatasetFetcher;
