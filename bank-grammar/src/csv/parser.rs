//! Импорт CSV без строки заголовка.

use crate::config::CsvImportConfig;
use crate::date::parse_date;
use crate::encoding;
use crate::error::{Error, Result};
use crate::types::{ImportStats, Imported, Row, Table, Value};
use ::csv::{ReaderBuilder, StringRecord};

impl CsvImportConfig {
    /// Декодирует байты в заданной кодировке и импортирует их.
    pub fn import_bytes(&self, bytes: &[u8]) -> Result<Imported> {
        let text = encoding::decode(bytes, &self.encoding)?;
        self.import_str(&text)
    }

    /// Импортирует уже декодированный текст.
    ///
    /// Первые `trim_top` записей пропускаются, строки с неразборчивой датой
    /// отбрасываются и учитываются в статистике.
    pub fn import_str(&self, content: &str) -> Result<Imported> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter as u8)
            .from_reader(content.as_bytes());

        let mut stats = ImportStats::default();
        let mut rows = Vec::new();

        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let number = idx + 1;
            stats.read += 1;

            if idx < self.trim_top {
                stats.trimmed += 1;
                continue;
            }

            if self.strict_width && record.len() != self.fields.len() {
                return Err(Error::RowWidth {
                    row: number,
                    expected: self.fields.len(),
                    found: record.len(),
                });
            }

            let mut row = self.build_row(&record);

            let raw = row
                .get(&self.date_column)
                .and_then(Value::as_text)
                .unwrap_or_default();
            match parse_date(raw, &self.date_format) {
                Some(dt) => row.set(self.date_column.as_str(), dt),
                None => {
                    tracing::debug!(
                        row = number,
                        value = raw,
                        "дата не разобрана по шаблону '{}', строка отброшена",
                        self.date_format
                    );
                    stats.dropped += 1;
                    continue;
                }
            }

            rows.push(row);
        }

        tracing::info!(
            read = stats.read,
            trimmed = stats.trimmed,
            dropped = stats.dropped,
            kept = stats.kept(),
            "импорт CSV завершен"
        );
        if stats.kept() == 0 && stats.read > stats.trimmed {
            tracing::warn!("ни одна строка не прошла разбор даты");
        }

        Ok(Imported {
            table: Table::new(rows),
            stats,
        })
    }

    fn build_row(&self, record: &StringRecord) -> Row {
        let mut row: Row = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.as_str(), record.get(i).unwrap_or("").trim()))
            .collect();

        if record.len() > self.fields.len() {
            tracing::debug!(
                extra = record.len() - self.fields.len(),
                "лишние столбцы перенесены в overflow"
            );
            row.overflow = record
                .iter()
                .skip(self.fields.len())
                .map(|s| s.trim().to_string())
                .collect();
        }

        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(trim_top: usize) -> CsvImportConfig {
        CsvImportConfig {
            fields: vec!["date".into(), "desc".into(), "amount".into()],
            date_column: "date".into(),
            date_format: "%Y-%m-%d".into(),
            encoding: "utf-8".into(),
            trim_top,
            delimiter: ',',
            strict_width: false,
        }
    }

    fn text(row: &Row, field: &str) -> String {
        row.get(field).and_then(Value::as_text).unwrap().to_string()
    }

    #[test]
    fn test_drops_unparsable_date() {
        let content = "2023-01-05, Coffee, -3.50\nbad-date, Lunch, -12.00\n";
        let imported = config(0).import_str(content).unwrap();

        assert_eq!(imported.table.len(), 1);
        assert_eq!(imported.stats.dropped, 1);
        let row = &imported.table.rows[0];
        assert_eq!(text(row, "desc"), "Coffee");
        assert_eq!(text(row, "amount"), "-3.50");
        assert_eq!(
            row.get("date").and_then(Value::as_date).unwrap().to_string(),
            "2023-01-05 00:00:00"
        );
    }

    #[test]
    fn test_trim_top_skips_valid_rows() {
        let content = "2023-01-01,Header junk,0\n2023-01-02,A,1\n2023-01-03,B,2\n";
        let imported = config(1).import_str(content).unwrap();

        assert_eq!(imported.table.len(), 2);
        assert_eq!(imported.stats.trimmed, 1);
        assert_eq!(imported.stats.dropped, 0);
        assert_eq!(text(&imported.table.rows[0], "desc"), "A");
    }

    #[test]
    fn test_trimmed_rows_not_counted_as_failures() {
        let content = "Date,Description,Amount\n2023-01-02,A,1\n";
        let imported = config(1).import_str(content).unwrap();
        assert_eq!(imported.stats.dropped, 0);
        assert_eq!(imported.stats.kept(), 1);
    }

    #[test]
    fn test_short_row_padded_with_empty() {
        let imported = config(0).import_str("2023-01-02,A\n").unwrap();
        let row = &imported.table.rows[0];
        assert_eq!(text(row, "amount"), "");
        assert!(row.overflow.is_empty());
    }

    #[test]
    fn test_long_row_goes_to_overflow() {
        let imported = config(0).import_str("2023-01-02,A,1, x , y\n").unwrap();
        let row = &imported.table.rows[0];
        assert_eq!(text(row, "amount"), "1");
        assert_eq!(row.overflow, vec!["x", "y"]);
    }

    #[test]
    fn test_strict_width_rejects_mismatch() {
        let mut cfg = config(1);
        cfg.strict_width = true;

        let err = cfg.import_str("junk\n2023-01-02,A\n").unwrap_err();
        assert!(matches!(
            err,
            Error::RowWidth {
                row: 2,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let imported = config(0)
            .import_str("2023-01-02,A,1\n\n2023-01-03,B,2\n")
            .unwrap();
        assert_eq!(imported.stats.read, 2);
        assert_eq!(imported.table.len(), 2);
    }

    #[test]
    fn test_quoted_fields_and_delimiter() {
        let mut cfg = config(0);
        cfg.delimiter = ';';
        let imported = cfg
            .import_str("2023-01-02;\"Shop; \"\"Best\"\"\";-1,50\n")
            .unwrap();
        let row = &imported.table.rows[0];
        assert_eq!(text(row, "desc"), "Shop; \"Best\"");
        assert_eq!(text(row, "amount"), "-1,50");
    }

    #[test]
    fn test_import_bytes_decodes() {
        let mut cfg = config(0);
        cfg.encoding = "windows-1251".into();
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("2023-01-02,Кофе,1\n");
        let imported = cfg.import_bytes(&bytes).unwrap();
        assert_eq!(text(&imported.table.rows[0], "desc"), "Кофе");
    }

    #[test]
    fn test_partial_date_patterns_keep_rows() {
        let mut cfg = config(0);
        cfg.date_format = "%m/%Y".into();
        let imported = cfg.import_str("01/2023,A,1\n").unwrap();
        assert_eq!(imported.stats.kept(), 1);
        assert_eq!(imported.stats.dropped, 0);

        cfg.date_format = "%d.%m".into();
        let imported = cfg.import_str("05.01,A,1\n").unwrap();
        assert_eq!(imported.stats.kept(), 1);
        assert_eq!(
            imported.table.rows[0]
                .get("date")
                .and_then(Value::as_date)
                .unwrap()
                .to_string(),
            "1900-01-05 00:00:00"
        );
    }

    #[test]
    fn test_ascii_rejects_non_ascii_bytes() {
        let mut cfg = config(0);
        cfg.encoding = "ascii".into();
        let err = cfg.import_bytes(b"2023-01-05,caf\xe9,1\n").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
