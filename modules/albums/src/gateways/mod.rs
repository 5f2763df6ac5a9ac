pub mod local;

pub use local::AlbumsLocalClient;
