use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Options for [`format_datetime`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFormat {
    /// Moment to format; local now when unset
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    /// Append `hh:mm:ss`
    pub with_time: bool,
    pub date_separator: String,
    pub time_separator: String,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            date: None,
            with_time: true,
            date_separator: "/".to_string(),
            time_separator: ":".to_string(),
        }
    }
}

impl DateFormat {
    /// Default options for a fixed moment
    pub fn at(date: NaiveDateTime) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn date_only(mut self) -> Self {
        self.with_time = false;
        self
    }

    pub fn separators(mut self, date: &str, time: &str) -> Self {
        self.date_separator = date.to_string();
        self.time_separator = time.to_string();
        self
    }
}

/// Format as `YYYY/MM/DD hh:mm:ss` with the configured separators
pub fn format_datetime(options: &DateFormat) -> String {
    let date = options
        .date
        .unwrap_or_else(|| Local::now().naive_local());

    let mut formatted = format!(
        "{}{sep}{:02}{sep}{:02}",
        date.year(),
        date.month(),
        date.day(),
        sep = options.date_separator
    );

    if options.with_time {
        formatted.push_str(&format!(
            " {:02}{sep}{:02}{sep}{:02}",
            date.hour(),
            date.minute(),
            date.second(),
            sep = options.time_separator
        ));
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn moment() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_default_format_pads() {
        assert_eq!(format_datetime(&DateFormat::at(moment())), "2024/03/07 09:05:00");
    }

    #[test]
    fn test_date_only_with_custom_separators() {
        let options = DateFormat::at(moment()).date_only().separators("-", ".");
        assert_eq!(format_datetime(&options), "2024-03-07");

        let options = DateFormat::at(moment()).separators("-", ".");
        assert_eq!(format_datetime(&options), "2024-03-07 09.05.00");
    }

    #[test]
    fn test_defaults_to_now() {
        let formatted = format_datetime(&DateFormat::default().date_only());
        assert_eq!(formatted.len(), "YYYY/MM/DD".len());
    }
}
