//! The `kvfts-idx` data type.
//!
//! Index contents are not serialized, so a restart drops every binding.

use crate::handle::IndexHandle;
use kvfts_core::DataType;
use std::any::Any;

pub const TYPE_NAME: &str = "kvfts-idx";
pub const ENCODING_VERSION: i32 = 1;

pub const DESCRIPTION: &str = "Full-text search index built on tantivy";

pub fn data_type() -> DataType {
    DataType::new(TYPE_NAME, ENCODING_VERSION, free)
        .description(DESCRIPTION)
}

/// Called by the host once per value leaving the keyspace.
fn free(value: Box<dyn Any + Send>) {
    match value.downcast::<IndexHandle>() {
        Ok(mut handle) => {
            tracing::debug!(
                "Releasing index {} at {}",
                handle.name(),
                handle.path().display()
            );
            handle.release();
        }
        Err(_) => tracing::warn!("Asked to free a value that is not a {}", TYPE_NAME),
    }
}
