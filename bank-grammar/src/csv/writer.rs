//! Экспорт таблицы в CSV с заголовком.

use crate::config::ExportConfig;
use crate::date::format_date;
use crate::error::{Error, Result};
use crate::types::{Row, Table, Value};
use ::csv::{QuoteStyle, Terminator, WriterBuilder};
use std::collections::HashMap;
use std::io::Write;

/// Таблица, готовая к записи: заголовок и строки в его порядке.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    delimiter: u8,
}

impl ExportConfig {
    /// Переименовывает поля по column_map и форматирует даты.
    ///
    /// Поля, которых нет в column_map, в результат не попадают.
    pub fn export(&self, table: &Table) -> Result<ExportTable> {
        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| self.export_row(row, idx + 1))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(rows = rows.len(), "экспорт подготовлен");

        Ok(ExportTable {
            header: self.fields.clone(),
            rows,
            delimiter: self.delimiter as u8,
        })
    }

    fn export_row(&self, row: &Row, number: usize) -> Result<Vec<String>> {
        let mut mapped: HashMap<&str, &Value> = HashMap::with_capacity(self.column_map.len());
        for (source, target) in &self.column_map {
            let value = row.get(source).ok_or_else(|| Error::MissingField {
                field: source.clone(),
                row: number,
            })?;
            mapped.insert(target.as_str(), value);
        }

        match mapped.get(self.date_column.as_str()) {
            Some(Value::Date(_)) => {}
            Some(Value::Text(_)) => {
                return Err(Error::NotADate {
                    column: self.date_column.clone(),
                    row: number,
                })
            }
            None => {
                return Err(Error::MissingField {
                    field: self.date_column.clone(),
                    row: number,
                })
            }
        }

        self.fields
            .iter()
            .map(|name| match mapped.get(name.as_str()) {
                Some(Value::Text(s)) => Ok(s.clone()),
                Some(Value::Date(dt)) => format_date(dt, &self.date_format),
                None => Ok(String::new()),
            })
            .collect()
    }
}

impl ExportTable {
    /// Записывает таблицу в любой приемник, реализующий трейт Write.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF)
            .from_writer(writer);

        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(::csv::Error::from)?;

        Ok(())
    }

    /// Сериализует таблицу в память.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_date;

    fn config() -> ExportConfig {
        ExportConfig {
            fields: vec!["Date".into(), "Payee".into(), "Amount".into()],
            column_map: [("date", "Date"), ("desc", "Payee"), ("amount", "Amount")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            date_column: "Date".into(),
            date_format: "%m/%d/%Y".into(),
            delimiter: ',',
        }
    }

    fn row(date: &str, desc: &str, amount: &str) -> Row {
        let mut row: Row = [("desc", desc), ("amount", amount), ("memo", "internal")]
            .into_iter()
            .collect();
        row.set("date", parse_date(date, "%Y-%m-%d").unwrap());
        row
    }

    #[test]
    fn test_export_maps_and_formats() {
        let table = Table::new(vec![row("2023-01-05", "Coffee", "-3.50")]);
        let out = config().export(&table).unwrap();

        assert_eq!(out.header, vec!["Date", "Payee", "Amount"]);
        assert_eq!(out.rows, vec![vec!["01/05/2023", "Coffee", "-3.50"]]);
    }

    #[test]
    fn test_unmapped_fields_dropped() {
        let table = Table::new(vec![row("2023-01-05", "Coffee", "-3.50")]);
        let bytes = config().export(&table).unwrap().to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("internal"));
    }

    #[test]
    fn test_missing_field_is_error() {
        let mut cfg = config();
        cfg.column_map.insert("category".into(), "Category".into());
        cfg.fields.push("Category".into());

        let table = Table::new(vec![row("2023-01-05", "Coffee", "-3.50")]);
        let err = cfg.export(&table).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, row: 1 } if field == "category"));
    }

    #[test]
    fn test_text_in_date_column_is_error() {
        let mut cfg = config();
        cfg.column_map.remove("date");
        cfg.column_map.remove("desc");
        cfg.column_map.insert("desc".into(), "Date".into());
        cfg.column_map.insert("date".into(), "Payee".into());

        let table = Table::new(vec![row("2023-01-05", "Coffee", "-3.50")]);
        assert!(matches!(
            cfg.export(&table),
            Err(Error::NotADate { row: 1, .. })
        ));
    }

    #[test]
    fn test_quoting_and_crlf() {
        let table = Table::new(vec![row("2023-01-05", "Shop, \"Best\"", "1\n2")]);
        let bytes = config().export(&table).unwrap().to_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Date,Payee,Amount\r\n01/05/2023,\"Shop, \"\"Best\"\"\",\"1\n2\"\r\n"
        );
    }

    #[test]
    fn test_order_preserved() {
        let table = Table::new(vec![
            row("2023-03-01", "C", "3"),
            row("2023-01-01", "A", "1"),
            row("2023-02-01", "B", "2"),
        ]);
        let out = config().export(&table).unwrap();
        let payees: Vec<_> = out.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(payees, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let bytes = config()
            .export(&Table::default())
            .unwrap()
            .to_bytes()
            .unwrap();
        assert_eq!(bytes, b"Date,Payee,Amount\r\n");
    }
}
