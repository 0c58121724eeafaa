use serde::Deserialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Month, OffsetDateTime,
};

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    fn month_abbr(self, month: Month) -> &'static str {
        const PT_BR: [&str; 12] = [
            "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
        ];
        const EN_US: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];

        let index = usize::from(u8::from(month)) - 1;
        match self {
            Locale::PtBr => PT_BR[index],
            Locale::EnUs => EN_US[index],
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::EnUs => "en-US",
        }
    }

    /// Shown in place of a date for posts that were never published.
    pub fn missing_date(self) -> &'static str {
        match self {
            Locale::PtBr => "Data indisponível",
            Locale::EnUs => "Unpublished",
        }
    }
}

/// Parses the CMS timestamp form (`2021-03-15T19:25:28+0000`), falling back to RFC 3339.
pub fn parse_publication_date(raw: &str) -> Option<OffsetDateTime> {
    let prismic = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
    );

    OffsetDateTime::parse(raw, prismic)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .ok()
}

/// `dd MMM yyyy` in the given locale, or the locale's placeholder when there is no date.
pub fn format_publication_date(date: Option<OffsetDateTime>, locale: Locale) -> String {
    match date {
        Some(date) => format!(
            "{:02} {} {:04}",
            date.day(),
            locale.month_abbr(date.month()),
            date.year()
        ),
        None => locale.missing_date().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_prismic_offset_without_colon() {
        let parsed = parse_publication_date("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(parsed, datetime!(2021-03-25 19:25:28 UTC));
    }

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_publication_date("2021-04-02T08:00:00-03:00").unwrap();
        assert_eq!(parsed, datetime!(2021-04-02 08:00:00 -3));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_publication_date(""), None);
        assert_eq!(parse_publication_date("15/03/2021"), None);
    }

    #[test]
    fn formats_in_portuguese() {
        let date = datetime!(2021-03-05 10:00:00 UTC);
        assert_eq!(format_publication_date(Some(date), Locale::PtBr), "05 mar 2021");

        let date = datetime!(2020-02-19 10:00:00 UTC);
        assert_eq!(format_publication_date(Some(date), Locale::PtBr), "19 fev 2020");
    }

    #[test]
    fn formats_in_english() {
        let date = datetime!(2021-12-31 23:59:59 UTC);
        assert_eq!(format_publication_date(Some(date), Locale::EnUs), "31 Dec 2021");
    }

    #[test]
    fn missing_date_uses_placeholder() {
        assert_eq!(format_publication_date(None, Locale::PtBr), "Data indisponível");
        assert_eq!(format_publication_date(None, Locale::EnUs), "Unpublished");
    }
}
