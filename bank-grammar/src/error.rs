//! Модуль обработки ошибок библиотеки.

use std::path::PathBuf;

/// Основной тип ошибки библиотеки.
///
/// Ошибка разбора даты в отдельной строке сюда не входит: такие строки
/// отбрасываются при импорте и учитываются в [`crate::ImportStats`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Банк не найден в объединенном наборе грамматик.
    #[error("банк '{bank}' не найден в грамматиках (известные: {})", known_list(.known))]
    ConfigNotFound { bank: String, known: Vec<String> },

    /// Файл грамматики или запись банка не удалось разобрать.
    #[error("некорректная грамматика {origin}: {message}")]
    ConfigMalformed { origin: String, message: String },

    /// Грамматика разобрана, но противоречива.
    #[error("грамматика '{bank}' противоречива: {reason}")]
    InvalidGrammar { bank: String, reason: String },

    /// Ошибка ввода/вывода с указанием пути.
    #[error("ошибка ввода/вывода '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Неизвестная метка кодировки.
    #[error("неизвестная кодировка: {0}")]
    UnknownEncoding(String),

    /// Содержимое файла недопустимо для заданной кодировки.
    #[error("содержимое не является корректным текстом в кодировке {encoding}")]
    Decode { encoding: String },

    /// Ошибка чтения или записи CSV.
    #[error("ошибка CSV: {0}")]
    Csv(#[from] ::csv::Error),

    /// Число столбцов строки не совпадает с объявленным (режим strict_width).
    #[error("строка {row}: ожидалось столбцов {expected}, найдено {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Поле из column_map отсутствует в строке.
    #[error("строка {row}: отсутствует поле '{field}'")]
    MissingField { field: String, row: usize },

    /// Столбец даты при экспорте содержит текст, а не дату.
    #[error("строка {row}: столбец '{column}' не содержит разобранной даты")]
    NotADate { column: String, row: usize },

    /// Шаблон даты не удалось применить при форматировании.
    #[error("не удалось отформатировать дату по шаблону '{0}'")]
    DateFormat(String),
}

impl Error {
    /// Ошибка ввода/вывода для указанного пути.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

fn known_list(known: &[String]) -> String {
    if known.is_empty() {
        "нет".to_string()
    } else {
        known.join(", ")
    }
}

/// Тип Result с ошибкой библиотеки.
pub type Result<T> = std::result::Result<T, Error>;
