pub mod dates;
pub mod photo_hash;
pub mod photo_ref;
pub mod slug;
