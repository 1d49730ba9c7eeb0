//! Модуль импорта и экспорта текста с разделителями.

pub mod parser;
pub mod writer;

pub use writer::ExportTable;
