mod aggregator;
mod fed_avg;

pub use aggregator::Aggregator;
pub use fed_avg::FedAvg;
