pub mod lifx_client;

pub use lifx_client::LifxClient;
