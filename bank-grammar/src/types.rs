//! Базовые типы данных для представления таблицы выписки.

use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Значение поля строки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Текст (уже очищенный от пробелов по краям).
    Text(String),
    /// Разобранная дата/время.
    Date(NaiveDateTime),
}

impl Value {
    /// Возвращает текст, если значение текстовое.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Date(_) => None,
        }
    }

    /// Возвращает дату, если значение уже разобрано.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            Value::Text(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(dt)
    }
}

/// Строка таблицы: имя поля -> значение.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<String, Value>,
    /// Столбцы сверх объявленных в `fields`, в исходном порядке.
    pub overflow: Vec<String>,
}

impl Row {
    /// Создает пустую строку.
    pub fn new() -> Self {
        Self::default()
    }

    /// Значение поля.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Устанавливает значение поля, заменяя прежнее.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

/// Таблица: упорядоченный список строк.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Счетчики этапа импорта.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Всего записей в источнике (пустые строки не считаются).
    pub read: usize,
    /// Пропущено по trim_top.
    pub trimmed: usize,
    /// Отброшено из-за неразборчивой даты.
    pub dropped: usize,
}

impl ImportStats {
    /// Число строк, попавших в таблицу.
    pub fn kept(&self) -> usize {
        self.read - self.trimmed - self.dropped
    }
}

/// Результат импорта: таблица и счетчики.
#[derive(Debug, Clone, Default)]
pub struct Imported {
    pub table: Table,
    pub stats: ImportStats,
}
