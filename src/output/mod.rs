pub mod export;

pub use export::{export, Export, ExportFormat};
