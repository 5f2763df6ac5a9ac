pub mod http_albums_client;

pub use http_albums_client::HttpAlbumsClient;
