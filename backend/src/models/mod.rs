pub mod directory;
pub mod ids;
pub mod metadata;
pub mod snapshot;

pub use directory::{NameDirectory, StaticDirectory};
pub use ids::{DatabaseId, PeerAddress, ServerId, TableId, parse_hyphenated_uuid};
pub use metadata::{
    ClusterMetadata, DatabaseMetadata, IdentifierFormat, ServerMetadata, TableMetadata,
    TopologyMetadata,
};
pub use snapshot::{ClusterSnapshot, SnapshotServer};
