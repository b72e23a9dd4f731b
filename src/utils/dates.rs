use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use mongodb::bson::{Bson, DateTime as BsonDateTime};
use regex::Regex;
use serde::{de::Error as _, Deserialize, Deserializer};

lazy_static! {
    static ref MM_YYYY: Regex = Regex::new(r"^(\d{2})/(\d{4})$").unwrap();
    static ref YYYY_MM: Regex = Regex::new(r"^(\d{4})-(\d{2})$").unwrap();
}

/// Normaliza datas de currículo para RFC 3339 (UTC)
///
/// Aceita `MM/YYYY`, `YYYY-MM`, `YYYY-MM-DD` e RFC 3339 completo.
/// Retorna `None` para vazio ou formato não reconhecido.
pub fn parse_date_field(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(caps) = MM_YYYY.captures(value) {
        let month: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return first_of_month(year, month);
    }

    if let Some(caps) = YYYY_MM.captures(value) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return first_of_month(year, month);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn first_of_month(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

/// Converte um campo opcional de data do currículo para a forma normalizada
pub fn normalize_date_string(value: Option<&str>) -> Option<String> {
    value
        .and_then(parse_date_field)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

/// BSON DateTime -> string ISO para respostas JSON
pub fn to_iso(dt: &BsonDateTime) -> String {
    dt.try_to_rfc3339_string()
        .unwrap_or_else(|_| dt.timestamp_millis().to_string())
}

pub fn to_iso_opt(dt: &Option<BsonDateTime>) -> Option<String> {
    dt.as_ref().map(to_iso)
}

/// chrono -> BSON DateTime
pub fn bson_from_chrono(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

/// Momento `days` dias atrás (ou à frente, se negativo) em BSON
pub fn days_from_now(days: i64) -> BsonDateTime {
    bson_from_chrono(Utc::now() + chrono::Duration::days(days))
}

pub fn hours_ago(hours: i64) -> BsonDateTime {
    bson_from_chrono(Utc::now() - chrono::Duration::hours(hours))
}

/// Data opcional gravada como BSON Date
///
/// Aceita o BSON Date do banco, a forma estendida `{"$date": ...}`, epoch em
/// milissegundos ou uma string em qualquer formato de `parse_date_field`
/// (vinda da API ou de documentos antigos). String vazia vira `None`.
pub fn deserialize_flexible_date<'de, D>(deserializer: D) -> Result<Option<BsonDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Bson>::deserialize(deserializer)? {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::DateTime(dt)) => Ok(Some(dt)),
        Some(Bson::Int64(millis)) => Ok(Some(BsonDateTime::from_millis(millis))),
        Some(Bson::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Bson::String(s)) => parse_date_field(&s)
            .map(|dt| Some(bson_from_chrono(dt)))
            .ok_or_else(|| D::Error::custom(format!("invalid date: {}", s))),
        Some(other) => Err(D::Error::custom(format!("expected a date, got {}", other))),
    }
}
