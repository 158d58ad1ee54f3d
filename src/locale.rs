//! Poster label translations.
//!
//! Only the handful of strings that end up inside a poster live here; CLI
//! messages stay in English.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "en_US", alias = "")]
    English,
    #[serde(rename = "zh_CN", alias = "zh")]
    Chinese,
}

/// Translatable poster labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    MyTracks,
    Athlete,
    Statistics,
    Number,
    Weekly,
    Total,
    Avg,
    Min,
    Max,
}

impl Language {
    pub fn translate(self, label: Label) -> &'static str {
        match (self, label) {
            (Self::English, Label::MyTracks) => "MY TRACKS",
            (Self::English, Label::Athlete) => "ATHLETE",
            (Self::English, Label::Statistics) => "STATISTICS",
            (Self::English, Label::Number) => "Number",
            (Self::English, Label::Weekly) => "Weekly",
            (Self::English, Label::Total) => "Total",
            (Self::English, Label::Avg) => "Avg",
            (Self::English, Label::Min) => "Min",
            (Self::English, Label::Max) => "Max",
            (Self::Chinese, Label::MyTracks) => "我的轨迹",
            (Self::Chinese, Label::Athlete) => "跑者",
            (Self::Chinese, Label::Statistics) => "统计",
            (Self::Chinese, Label::Number) => "次数",
            (Self::Chinese, Label::Weekly) => "每周",
            (Self::Chinese, Label::Total) => "总计",
            (Self::Chinese, Label::Avg) => "平均",
            (Self::Chinese, Label::Min) => "最短",
            (Self::Chinese, Label::Max) => "最长",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_is_default() {
        assert_eq!(Language::default().translate(Label::MyTracks), "MY TRACKS");
    }

    #[test]
    fn parse_language_codes() {
        #[derive(Deserialize)]
        struct W {
            language: Language,
        }
        let w: W = toml::from_str(r#"language = "zh_CN""#).unwrap();
        assert_eq!(w.language, Language::Chinese);
        let w: W = toml::from_str(r#"language = """#).unwrap();
        assert_eq!(w.language, Language::English);
    }

    #[test]
    fn chinese_labels() {
        assert_eq!(Language::Chinese.translate(Label::Total), "总计");
    }
}
