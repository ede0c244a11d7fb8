pub mod store;

pub use store::{JsonFileStore, MappingStore, MemoryStore, SavedMapping, StoreError};
