// Premium Link Types - validated identifiers shared by the premium link server and CLI

pub mod address;
pub mod profile;
pub mod status;

pub use address::{AddressError, WalletAddress};
pub use profile::{ProfileId, ProfileIdError};
pub use status::UserStatus;
