//! Объединение фрагментов грамматик и поиск банка.

use crate::config::Grammar;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Расширение файлов грамматик.
pub const GRAMMAR_EXTENSION: &str = "toml";

/// Фрагмент: идентификатор банка -> запись грамматики.
pub type Fragment = toml::Table;

/// Объединенный набор грамматик.
///
/// Объединение неглубокое: запись банка из более позднего фрагмента
/// полностью заменяет прежнюю, поля разных фрагментов не смешиваются.
#[derive(Debug, Clone, Default)]
pub struct GrammarSet {
    entries: toml::Table,
    origins: BTreeMap<String, String>,
}

impl GrammarSet {
    /// Создает пустой набор.
    pub fn new() -> Self {
        Self::default()
    }

    /// Разбирает один TOML-документ во фрагмент.
    pub fn parse_fragment(content: &str, origin: &str) -> Result<Fragment> {
        let fragment = content.parse::<Fragment>().map_err(|e: toml::de::Error| {
            Error::ConfigMalformed {
                origin: origin.to_string(),
                message: e.to_string(),
            }
        })?;

        if let Some((bank, _)) = fragment.iter().find(|(_, v)| !v.is_table()) {
            return Err(Error::ConfigMalformed {
                origin: origin.to_string(),
                message: format!("запись '{}' должна быть таблицей", bank),
            });
        }

        Ok(fragment)
    }

    /// Добавляет фрагмент поверх уже накопленных.
    pub fn merge(&mut self, fragment: Fragment, origin: &str) {
        for (bank, entry) in fragment {
            if let Some(previous) = self.origins.get(&bank) {
                tracing::debug!(
                    bank = bank.as_str(),
                    previous = previous.as_str(),
                    origin,
                    "запись банка заменена целиком"
                );
            }
            self.origins.insert(bank.clone(), origin.to_string());
            self.entries.insert(bank, entry);
        }
    }

    /// Собирает набор из фрагментов в заданном порядке.
    pub fn from_fragments<'a, I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = (Fragment, &'a str)>,
    {
        let mut set = Self::new();
        for (fragment, origin) in fragments {
            set.merge(fragment, origin);
        }
        set
    }

    /// Загружает грамматики из файла или из каталога.
    ///
    /// Каталог обходится рекурсивно, файлы `*.toml` объединяются в
    /// лексикографическом порядке путей.
    pub fn load(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;

        let files = if metadata.is_dir() {
            let mut files = Vec::new();
            collect_grammar_files(path, &mut files)?;
            files.sort();
            if files.is_empty() {
                tracing::warn!(path = %path.display(), "в каталоге нет файлов грамматик");
            }
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut set = Self::new();
        for file in &files {
            let content = fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
            let origin = file.display().to_string();
            let fragment = Self::parse_fragment(&content, &origin)?;
            tracing::debug!(file = origin.as_str(), banks = fragment.len(), "фрагмент загружен");
            set.merge(fragment, &origin);
        }

        tracing::info!(files = files.len(), banks = set.len(), "грамматики загружены");
        Ok(set)
    }

    /// Число банков.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Отсортированный список идентификаторов банков.
    pub fn banks(&self) -> Vec<&str> {
        let mut banks: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        banks.sort_unstable();
        banks
    }

    /// Исходная запись банка без разбора.
    pub fn entry(&self, bank: &str) -> Option<&toml::Value> {
        self.entries.get(bank)
    }

    /// Откуда взята запись банка.
    pub fn origin(&self, bank: &str) -> Option<&str> {
        self.origins.get(bank).map(String::as_str)
    }

    /// Находит, разбирает и проверяет грамматику банка.
    pub fn grammar(&self, bank: &str) -> Result<Grammar> {
        let entry = self.entry(bank).ok_or_else(|| Error::ConfigNotFound {
            bank: bank.to_string(),
            known: self.banks().into_iter().map(String::from).collect(),
        })?;

        let grammar = entry.clone().try_into::<Grammar>().map_err(|e: toml::de::Error| {
            Error::ConfigMalformed {
                origin: format!("{} [{}]", self.origin(bank).unwrap_or("?"), bank),
                message: e.to_string(),
            }
        })?;

        grammar.validate(bank)?;
        Ok(grammar)
    }
}

fn collect_grammar_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_dir() {
            collect_grammar_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == GRAMMAR_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}
