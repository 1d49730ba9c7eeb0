//! Грамматика банка: описание импорта и экспорта.

use crate::date;
use crate::encoding::{self, DEFAULT_ENCODING};
use crate::error::{Error, Result};
use crate::types::Imported;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Грамматика одного банка.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Grammar {
    pub import: ImportConfig,
    pub export: ExportConfig,
}

/// Настройки импорта; вариант выбирается ключом `filetype`.
///
/// Поддерживаемые форматы перечислены явно: новый формат добавляется
/// новым вариантом.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "filetype", rename_all = "lowercase")]
pub enum ImportConfig {
    /// Текст с разделителями без строки заголовка.
    Csv(CsvImportConfig),
}

/// Настройки импорта CSV.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CsvImportConfig {
    /// Имена столбцов по порядку.
    pub fields: Vec<String>,
    /// Поле с датой.
    pub date_column: String,
    /// Шаблон разбора даты (strftime).
    pub date_format: String,
    /// Метка кодировки входного файла.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Сколько первых записей пропустить.
    #[serde(default)]
    pub trim_top: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Ошибка вместо дополнения/переноса при несовпадении числа столбцов.
    #[serde(default)]
    pub strict_width: bool,
}

/// Настройки экспорта.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    /// Заголовок и порядок столбцов результата.
    pub fields: Vec<String>,
    /// Внутреннее имя поля -> имя столбца результата.
    pub column_map: BTreeMap<String, String>,
    /// Столбец результата с датой.
    pub date_column: String,
    /// Шаблон форматирования даты (strftime).
    pub date_format: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

fn default_delimiter() -> char {
    ','
}

impl ImportConfig {
    /// Значение ключа `filetype` для варианта.
    pub fn filetype(&self) -> &'static str {
        match self {
            ImportConfig::Csv(_) => "csv",
        }
    }

    /// Импортирует содержимое, уже прочитанное в память.
    pub fn import_bytes(&self, bytes: &[u8]) -> Result<Imported> {
        match self {
            ImportConfig::Csv(cfg) => cfg.import_bytes(bytes),
        }
    }

    /// Читает файл целиком и импортирует его.
    pub fn import_path(&self, path: &Path) -> Result<Imported> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        tracing::debug!(
            path = %path.display(),
            filetype = self.filetype(),
            bytes = bytes.len(),
            "источник прочитан"
        );
        self.import_bytes(&bytes)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            ImportConfig::Csv(cfg) => cfg.validate(),
        }
    }
}

impl CsvImportConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.fields.is_empty() {
            return Err("import.fields пуст".to_string());
        }
        if let Some(dup) = first_duplicate(&self.fields) {
            return Err(format!("import.fields: повторяется поле '{}'", dup));
        }
        if !self.fields.contains(&self.date_column) {
            return Err(format!(
                "import.date_column '{}' отсутствует в import.fields",
                self.date_column
            ));
        }
        if !date::is_valid_pattern(&self.date_format) {
            return Err(format!(
                "import.date_format: некорректный шаблон '{}'",
                self.date_format
            ));
        }
        if !encoding::is_known(&self.encoding) {
            return Err(format!("import.encoding: неизвестная кодировка '{}'", self.encoding));
        }
        check_delimiter("import", self.delimiter)
    }
}

impl ExportConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(dup) = first_duplicate(&self.fields) {
            return Err(format!("export.fields: повторяется столбец '{}'", dup));
        }

        let mut targets = BTreeSet::new();
        for (source, target) in &self.column_map {
            if !targets.insert(target.as_str()) {
                return Err(format!(
                    "export.column_map: столбец '{}' назначен нескольким полям (в т.ч. '{}')",
                    target, source
                ));
            }
        }

        let declared: BTreeSet<&str> = self.fields.iter().map(String::as_str).collect();
        if let Some(extra) = targets.difference(&declared).next() {
            return Err(format!(
                "export.column_map: столбец '{}' не объявлен в export.fields",
                extra
            ));
        }
        if let Some(unmapped) = declared.difference(&targets).next() {
            return Err(format!(
                "export.fields: столбец '{}' не заполняется через column_map",
                unmapped
            ));
        }

        if !declared.contains(self.date_column.as_str()) {
            return Err(format!(
                "export.date_column '{}' отсутствует в export.fields",
                self.date_column
            ));
        }
        if !date::is_valid_pattern(&self.date_format) {
            return Err(format!(
                "export.date_format: некорректный шаблон '{}'",
                self.date_format
            ));
        }
        check_delimiter("export", self.delimiter)
    }
}

impl Grammar {
    /// Проверяет согласованность грамматики до чтения входных данных.
    pub fn validate(&self, bank: &str) -> Result<()> {
        self.import
            .validate()
            .and_then(|_| self.export.validate())
            .map_err(|reason| Error::InvalidGrammar {
                bank: bank.to_string(),
                reason,
            })
    }
}

fn check_delimiter(section: &str, delimiter: char) -> std::result::Result<(), String> {
    if delimiter.is_ascii() && delimiter != '"' && delimiter != '\n' && delimiter != '\r' {
        Ok(())
    } else {
        Err(format!("{}.delimiter: недопустимый разделитель {:?}", section, delimiter))
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .find(|item| !seen.insert(item.as_str()))
        .map(String::as_str)
}
