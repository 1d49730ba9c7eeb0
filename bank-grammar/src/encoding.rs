//! Декодирование входных файлов в заданной кодировке.
//!
//! Имена кодировок принимаются в написании Python (`utf_8`, `latin_1`,
//! `cp437`, `mac_roman`) и как метки WHATWG (`windows-1251`, `koi8-r`).

use crate::error::{Error, Result};
use encoding_rs::{Encoding, MACINTOSH, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, X_MAC_CYRILLIC};
use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Кодировка по умолчанию.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Байты, не определенные в cp1252.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Верхняя половина cp437 (0x80..=0xFF).
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

/// Способ декодирования для метки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    /// Кодировка encoding_rs; `strip_bom` для `utf-8-sig`.
    Standard {
        encoding: &'static Encoding,
        strip_bom: bool,
    },
    /// Только 7-битные байты.
    Ascii,
    /// ISO-8859-1: байт равен кодовой точке.
    Latin1,
    Cp437,
}

impl Codec {
    fn name(&self) -> &'static str {
        match self {
            Codec::Standard { encoding, .. } => encoding.name(),
            Codec::Ascii => "ascii",
            Codec::Latin1 => "latin-1",
            Codec::Cp437 => "cp437",
        }
    }

    fn standard(encoding: &'static Encoding) -> Self {
        Codec::Standard {
            encoding,
            strip_bom: false,
        }
    }
}

/// Приводит имя к виду Python: нижний регистр, `_` и пробел как `-`.
fn normalize_label(label: &str) -> String {
    label.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// Находит способ декодирования по имени кодировки.
///
/// Имена Python проверяются раньше меток WHATWG: по WHATWG `ascii` и
/// `latin1` означают windows-1252.
fn lookup(label: &str) -> Result<Codec> {
    let name = normalize_label(label);

    let codec = match name.as_str() {
        "utf-8-sig" | "utf8-sig" => Codec::Standard {
            encoding: UTF_8,
            strip_bom: true,
        },
        "utf-8" | "utf8" | "u8" | "utf" | "cp65001" => Codec::standard(UTF_8),
        "utf-16-le" | "utf-16le" => Codec::standard(UTF_16LE),
        "utf-16-be" | "utf-16be" => Codec::standard(UTF_16BE),
        "ascii" | "us-ascii" | "646" | "ansi-x3.4-1968" | "iso646-us" | "cp367" | "csascii" => {
            Codec::Ascii
        }
        "latin-1" | "latin1" | "latin" | "l1" | "iso-8859-1" | "iso8859-1" | "iso88591"
        | "iso-8859-1:1987" | "8859" | "cp819" | "ibm819" | "iso-ir-100" | "csisolatin1" => {
            Codec::Latin1
        }
        "cp437" | "ibm437" | "437" | "cspc8codepage437" => Codec::Cp437,
        "mac-roman" | "macroman" | "macintosh" => Codec::standard(MACINTOSH),
        "mac-cyrillic" | "maccyrillic" => Codec::standard(X_MAC_CYRILLIC),
        _ => Encoding::for_label(label.trim().as_bytes())
            .or_else(|| Encoding::for_label(name.as_bytes()))
            .map(Codec::standard)
            .ok_or_else(|| Error::UnknownEncoding(label.trim().to_string()))?,
    };

    Ok(codec)
}

/// Проверяет, что имя кодировки известно.
pub fn is_known(label: &str) -> bool {
    lookup(label).is_ok()
}

/// Декодирует байты без замены некорректных последовательностей.
pub fn decode<'a>(bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>> {
    let codec = lookup(label)?;
    let invalid = || Error::Decode {
        encoding: codec.name().to_string(),
    };

    match codec {
        Codec::Ascii => {
            if !bytes.is_ascii() {
                return Err(invalid());
            }
            Ok(encoding_rs::mem::decode_latin1(bytes))
        }
        Codec::Latin1 => Ok(encoding_rs::mem::decode_latin1(bytes)),
        Codec::Cp437 => Ok(decode_cp437(bytes)),
        Codec::Standard {
            encoding,
            strip_bom,
        } => {
            let bytes = if strip_bom {
                bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
            } else {
                bytes
            };

            if encoding == WINDOWS_1252 && bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                return Err(invalid());
            }

            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or_else(invalid)
        }
    }
}

fn decode_cp437(bytes: &[u8]) -> Cow<'_, str> {
    if bytes.is_ascii() {
        return encoding_rs::mem::decode_latin1(bytes);
    }

    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP437_HIGH[(b - 0x80) as usize]
            }
        })
        .collect::<String>()
        .into()
}
