//! RSA key material: parsing, validated key pairs, key ids and SPKI encoding

pub mod der;
pub mod key_helper;
pub mod key_id;
pub mod key_pair;

pub use key_helper::{KeyHelper, MIN_RSA_KEY_BITS};
pub use key_id::{KeyId, KeyIdBuilder};
pub use key_pair::AsymmetricKeyPair;
