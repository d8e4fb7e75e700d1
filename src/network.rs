pub mod public_address;

pub use public_address::PublicAddressResolver;
