mod loader;
mod partition;
mod scaler;

pub use loader::{PartitionLoader, partition_id, read_column, read_id_list};
pub use partition::{Partition, Split};
pub use scaler::MinMaxScaler;
