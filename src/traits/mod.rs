mod native;
mod table;

pub(crate) use native::transaction_open_after;
pub use native::{settle, HandleSnapshot, NativeHandle, NativeStatement};
pub use table::Table;
