//! Page-side helper functions.
//!
//! Each submodule is independent of the listener registry.

pub mod crypto;
pub mod date;
pub mod device;
pub mod storage;
pub mod text;
pub mod url;
pub mod validate;

pub use crypto::{random_hex, CryptoManager};
pub use date::{format_datetime, DateFormat};
pub use device::DeviceInfo;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageArea, StorageKind};
pub use text::display_width;
pub use url::{decode_params, drop_empty_values, encode_params, pick_keys, strip_fragment};
pub use validate::{has_cjk_char, has_special_char, has_sql_keyword, validate, ValidationKind};
