pub mod dates;
pub mod mapping;
pub mod table;
pub mod transaction;

pub use mapping::{FieldTag, HeaderMapping, MappingError};
pub use table::{Cell, RawTable};
pub use transaction::Transaction;
