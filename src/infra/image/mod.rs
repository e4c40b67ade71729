pub mod a1111_client;
pub mod bittensor_client;
pub mod horde_client;
mod http;

pub use a1111_client::A1111Client;
pub use bittensor_client::BittensorClient;
pub use horde_client::HordeClient;
