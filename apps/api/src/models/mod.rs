pub mod reference;

pub use reference::ReferenceDocument;
