//! # Bank Grammar
//!
//! Библиотека для приведения банковских CSV-выгрузок к единому формату
//! (совместимому с YNAB) по декларативным грамматикам.
//!
//! ## Устройство
//!
//! - **Грамматики** - TOML-файлы, по одной таблице на банк, с разделами
//!   `import` и `export`. Несколько файлов объединяются неглубоко: запись
//!   банка из более позднего файла заменяет прежнюю целиком.
//! - **Импорт** - чтение файла без заголовка в таблицу строк; строки с
//!   неразборчивой датой отбрасываются.
//! - **Экспорт** - переименование полей по `column_map`, форматирование
//!   даты и запись CSV с заголовком.
//!
//! ## Пример использования
//!
//! ```rust,ignore
//! use bank_grammar::GrammarSet;
//! use std::path::Path;
//!
//! let grammars = GrammarSet::load(Path::new("grammars"))?;
//! let grammar = grammars.grammar("nordea")?;
//! let normalized = bank_grammar::normalize_file(Path::new("export.csv"), &grammar)?;
//! std::fs::write("ynab.csv", normalized.output)?;
//! ```

pub mod config;
pub mod csv;
pub mod date;
pub mod encoding;
pub mod error;
pub mod resolver;
pub mod types;

pub use crate::config::{CsvImportConfig, ExportConfig, Grammar, ImportConfig};
pub use crate::csv::ExportTable;
pub use crate::error::{Error, Result};
pub use crate::resolver::{Fragment, GrammarSet};
pub use crate::types::*;

use std::path::Path;

/// Результат полного прогона: CSV в памяти и счетчики импорта.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub output: Vec<u8>,
    pub stats: ImportStats,
}

/// Импортирует содержимое и сериализует его по грамматике.
///
/// Результат целиком находится в памяти: при любой ошибке ничего не
/// возвращается.
pub fn normalize_bytes(content: &[u8], grammar: &Grammar) -> Result<Normalized> {
    let imported = grammar.import.import_bytes(content)?;
    finish(imported, grammar)
}

/// Читает файл и приводит его к выходному формату.
pub fn normalize_file(path: &Path, grammar: &Grammar) -> Result<Normalized> {
    let imported = grammar.import.import_path(path)?;
    finish(imported, grammar)
}

fn finish(imported: Imported, grammar: &Grammar) -> Result<Normalized> {
    let output = grammar.export.export(&imported.table)?.to_bytes()?;
    Ok(Normalized {
        output,
        stats: imported.stats,
    })
}
