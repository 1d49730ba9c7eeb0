//! CLI-утилита для приведения банковских выгрузок к формату YNAB.

use clap::Parser;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bank_grammar::{normalize_file, Error, GrammarSet, Result};

/// Ошибка запуска CLI.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Grammar(#[from] Error),

    #[error("не указаны входной файл и банк")]
    MissingTarget,
}

/// Имя файла результата, если --output указывает на каталог.
const DEFAULT_OUTPUT_NAME: &str = "ynab.csv";

/// Bank Normalizer - приведение выгрузок банков к формату YNAB.
///
/// Читает CSV-выгрузку банка по грамматике из TOML-файлов и записывает
/// нормализованный CSV.
#[derive(Parser)]
#[command(name = "normalize")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Входной файл выгрузки
    #[arg(required_unless_present = "list")]
    input: Option<PathBuf>,

    /// Идентификатор банка в грамматиках
    #[arg(required_unless_present = "list")]
    bank: Option<String>,

    /// Файл результата или каталог для ynab.csv
    #[arg(long, short = 'o', default_value = "./output")]
    output: PathBuf,

    /// Файл грамматики или каталог с файлами *.toml
    #[arg(long, default_value = "./grammars")]
    grammars: PathBuf,

    /// Показать известные банки и выйти
    #[arg(long)]
    list: bool,

    /// Подробный вывод
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Путь файла результата: каталог дополняется именем ynab.csv.
fn resolve_output(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DEFAULT_OUTPUT_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Пишет во временный файл рядом и переименовывает его в целевой.
fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let filename = path
        .file_name()
        .ok_or_else(|| {
            Error::io(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "путь без имени файла"),
            )
        })?
        .to_string_lossy();
    let tmp_path = path.with_file_name(format!(".{}.tmp", filename));

    let result = fs::write(&tmp_path, content).and_then(|_| fs::rename(&tmp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::io(path, e));
    }

    Ok(())
}

fn list_banks(grammars: &GrammarSet) {
    for bank in grammars.banks() {
        match grammars.origin(bank) {
            Some(origin) => println!("{}\t{}", bank, origin),
            None => println!("{}", bank),
        }
    }
}

fn run(args: &Args) -> std::result::Result<(), CliError> {
    if args.list {
        list_banks(&GrammarSet::load(&args.grammars)?);
        return Ok(());
    }

    let (Some(input), Some(bank)) = (&args.input, &args.bank) else {
        return Err(CliError::MissingTarget);
    };

    let grammars = GrammarSet::load(&args.grammars)?;
    let grammar = grammars.grammar(bank)?;
    let normalized = normalize_file(input, &grammar)?;

    let output = resolve_output(&args.output);
    write_atomically(&output, &normalized.output)?;

    tracing::info!(
        bank = bank.as_str(),
        rows = normalized.stats.kept(),
        dropped = normalized.stats.dropped,
        output = %output.display(),
        "результат записан"
    );

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Ошибка: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_output(dir.path()), dir.path().join("ynab.csv"));
    }

    #[test]
    fn test_resolve_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("budget.csv");
        assert_eq!(resolve_output(&file), file);
    }

    #[test]
    fn test_write_atomically_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.csv");
        write_atomically(&file, b"a,b\r\n").unwrap();

        assert_eq!(fs::read(&file).unwrap(), b"a,b\r\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomically_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("missing").join("out.csv");
        assert!(matches!(
            write_atomically(&file, b"x"),
            Err(Error::Io { .. })
        ));
        assert!(!file.exists());
    }

    #[test]
    fn test_args_require_input_and_bank() {
        assert!(Args::try_parse_from(["normalize"]).is_err());
        assert!(Args::try_parse_from(["normalize", "--list"]).is_ok());

        let args = Args::try_parse_from(["normalize", "in.csv", "acme", "-o", "out"]).unwrap();
        assert_eq!(args.bank.as_deref(), Some("acme"));
        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.grammars, PathBuf::from("./grammars"));
    }

    #[test]
    fn test_run_without_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let args = Args {
            input: None,
            bank: Some("acme".to_string()),
            output: output.clone(),
            grammars: dir.path().to_path_buf(),
            list: false,
            verbose: false,
        };

        assert!(matches!(run(&args), Err(CliError::MissingTarget)));
        assert!(!output.exists());
    }

    #[test]
    fn test_cli_error_passes_grammar_message_through() {
        let source = Error::UnknownEncoding("klingon-8".to_string());
        let message = source.to_string();
        assert_eq!(CliError::from(source).to_string(), message);
    }
}
