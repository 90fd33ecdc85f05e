use actix_web::http::header::{AcceptLanguage, Header, Preference, Quality};
use actix_web::{HttpRequest, web};
use serde::Deserialize;
use shared::Locale;
use std::str::FromStr;

/// Every user-visible string the backend produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    NoFile,
    UnsupportedFormat,
    FileTooLarge { max_bytes: usize },
    InvalidImage,
    ProcessingFailed,
    NotFound,
    LowConfidence { confidence: f32 },
    Unknown,
    NotAvailable,
}

impl Message {
    pub fn text(&self, locale: Locale) -> String {
        match (self, locale) {
            (Message::NoFile, Locale::Id) => "Tidak ada file yang dipilih".into(),
            (Message::NoFile, Locale::En) => "No file was selected".into(),
            (Message::UnsupportedFormat, Locale::Id) => {
                "Format file tidak didukung. Gunakan PNG, JPG, JPEG, GIF, BMP, atau WEBP".into()
            }
            (Message::UnsupportedFormat, Locale::En) => {
                "Unsupported file format. Use PNG, JPG, JPEG, GIF, BMP or WEBP".into()
            }
            (Message::FileTooLarge { max_bytes }, Locale::Id) => format!(
                "File terlalu besar. Maksimal ukuran file adalah {}MB",
                megabytes(*max_bytes)
            ),
            (Message::FileTooLarge { max_bytes }, Locale::En) => format!(
                "File is too large. The maximum file size is {}MB",
                megabytes(*max_bytes)
            ),
            (Message::InvalidImage, Locale::Id) => "File bukan gambar yang valid".into(),
            (Message::InvalidImage, Locale::En) => "The file is not a valid image".into(),
            (Message::ProcessingFailed, Locale::Id) => {
                "Terjadi kesalahan saat memproses gambar".into()
            }
            (Message::ProcessingFailed, Locale::En) => {
                "An error occurred while processing the image".into()
            }
            (Message::NotFound, Locale::Id) => "Halaman tidak ditemukan".into(),
            (Message::NotFound, Locale::En) => "Page not found".into(),
            (Message::LowConfidence { confidence }, Locale::Id) => format!(
                "Pisang tidak terdeteksi dengan yakin (tingkat keyakinan {})",
                percent(*confidence)
            ),
            (Message::LowConfidence { confidence }, Locale::En) => format!(
                "No banana detected with enough confidence (confidence {})",
                percent(*confidence)
            ),
            (Message::Unknown, Locale::Id) => "tidak diketahui".into(),
            (Message::Unknown, Locale::En) => "unknown".into(),
            (Message::NotAvailable, Locale::Id) => "tidak tersedia".into(),
            (Message::NotAvailable, Locale::En) => "not available".into(),
        }
    }
}

/// Formats a probability as a percentage with two decimals, e.g. `42.00%`.
pub fn percent(confidence: f32) -> String {
    format!("{:.2}%", confidence * 100.0)
}

fn megabytes(bytes: usize) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb.fract() == 0.0 {
        format!("{}", mb as u64)
    } else {
        format!("{:.1}", mb)
    }
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// Picks the highest ranked supported language. `q=0` entries and `*` are
/// skipped.
pub fn negotiate(accept_language: AcceptLanguage) -> Option<Locale> {
    let accepted: Vec<_> = accept_language
        .0
        .into_iter()
        .filter(|item| item.quality > Quality::ZERO)
        .collect();

    AcceptLanguage(accepted)
        .ranked()
        .into_iter()
        .find_map(|preference| match preference {
            Preference::Specific(tag) => Locale::from_str(tag.primary_language()).ok(),
            Preference::Any => None,
        })
}

/// Resolves the locale for a request: `?lang=` first, then `Accept-Language`.
pub fn request_locale(req: &HttpRequest, default: Locale) -> Locale {
    let from_query = web::Query::<LangQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().lang)
        .and_then(|lang| Locale::from_str(lang.trim()).ok());
    if let Some(locale) = from_query {
        return locale;
    }

    AcceptLanguage::parse(req)
        .ok()
        .and_then(negotiate)
        .unwrap_or(default)
}
