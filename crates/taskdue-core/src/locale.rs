use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::countdown::Countdown;
use crate::error::Action;

/// Human-facing language for dates, countdowns and messages.
///
/// Display strings are never sent to the store; only the wire format is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "ja" | "ja-jp" | "ja_jp" => Ok(Locale::Ja),
            "en" | "en-us" | "en_us" | "en-gb" | "en_gb" => Ok(Locale::En),
            other => Err(anyhow!("unsupported locale: {other}")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Ja => f.write_str("ja"),
            Locale::En => f.write_str("en"),
        }
    }
}

impl Locale {
    /// Shown wherever a due date is absent.
    pub fn placeholder(self) -> &'static str {
        match self {
            Locale::Ja => "日付未選択",
            Locale::En => "no date selected",
        }
    }

    pub fn format_date(self, date: NaiveDate) -> String {
        match self {
            Locale::Ja => date.format("%Y年%m月%d日").to_string(),
            Locale::En => date.format("%b %d, %Y").to_string(),
        }
    }

    pub fn format_date_time(self, dt: NaiveDateTime) -> String {
        match self {
            Locale::Ja => dt.format("%Y年%m月%d日 %H:%M").to_string(),
            Locale::En => dt.format("%b %d, %Y %H:%M").to_string(),
        }
    }

    pub fn format_countdown(self, countdown: &Countdown) -> String {
        match (self, countdown) {
            (Locale::Ja, Countdown::Unset) => "期日なし".to_string(),
            (Locale::En, Countdown::Unset) => "no due date".to_string(),
            (Locale::Ja, Countdown::Overdue) => "期日を過ぎています".to_string(),
            (Locale::En, Countdown::Overdue) => "overdue".to_string(),
            (
                Locale::Ja,
                Countdown::Remaining {
                    days,
                    hours,
                    minutes,
                },
            ) => format!("{days}日 {hours}時間 {minutes}分"),
            (
                Locale::En,
                Countdown::Remaining {
                    days,
                    hours,
                    minutes,
                },
            ) => format!("{days}d {hours}h {minutes}m"),
        }
    }

    pub fn done_label(self, done: Option<bool>) -> &'static str {
        match (self, done) {
            (Locale::Ja, Some(true)) => "完了",
            (Locale::Ja, Some(false)) => "未完了",
            (Locale::En, Some(true)) => "done",
            (Locale::En, Some(false)) => "todo",
            (_, None) => "-",
        }
    }

    pub fn failure_prefix(self, action: Action) -> &'static str {
        match (self, action) {
            (Locale::Ja, Action::FetchLists) => "リストの取得に失敗しました。",
            (Locale::Ja, Action::FetchTasks) => "タスクの取得に失敗しました。",
            (Locale::Ja, Action::FetchTask) => "タスク情報の取得に失敗しました。",
            (Locale::Ja, Action::CreateTask) => "タスクの作成に失敗しました。",
            (Locale::Ja, Action::UpdateTask) => "更新に失敗しました。",
            (Locale::Ja, Action::DeleteTask) => "削除に失敗しました。",
            (Locale::En, Action::FetchLists) => "Failed to fetch lists. ",
            (Locale::En, Action::FetchTasks) => "Failed to fetch tasks. ",
            (Locale::En, Action::FetchTask) => "Failed to fetch task details. ",
            (Locale::En, Action::CreateTask) => "Failed to create task. ",
            (Locale::En, Action::UpdateTask) => "Failed to update task. ",
            (Locale::En, Action::DeleteTask) => "Failed to delete task. ",
        }
    }

    pub fn no_list_selected(self) -> &'static str {
        match self {
            Locale::Ja => "リストが選択されていません。",
            Locale::En => "No list selected.",
        }
    }

    pub fn not_editing(self) -> &'static str {
        match self {
            Locale::Ja => "編集中のタスクがありません。",
            Locale::En => "No stored task is being edited.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_tags() {
        assert_eq!("JA".parse::<Locale>().expect("ja"), Locale::Ja);
        assert_eq!("en-US".parse::<Locale>().expect("en"), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn formats_japanese_calendar_convention() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(9, 15, 0))
            .expect("valid date time");
        assert_eq!(Locale::Ja.format_date_time(dt), "2024年03月05日 09:15");
        assert_eq!(Locale::Ja.format_date(dt.date()), "2024年03月05日");
        assert_eq!(Locale::En.format_date_time(dt), "Mar 05, 2024 09:15");
    }

    #[test]
    fn formats_countdowns() {
        let remaining = Countdown::Remaining {
            days: 1,
            hours: 2,
            minutes: 30,
        };
        assert_eq!(Locale::Ja.format_countdown(&remaining), "1日 2時間 30分");
        assert_eq!(Locale::En.format_countdown(&remaining), "1d 2h 30m");
        assert_eq!(
            Locale::Ja.format_countdown(&Countdown::Overdue),
            "期日を過ぎています"
        );
    }
}
