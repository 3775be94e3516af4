//! 拼团系列标题解析
//!
//! 续期生成的活动标题形如 `"<base> #<n>"`，没有后缀的标题视为该系列的第 1 期。

use regex::Regex;
use std::sync::LazyLock;

static SERIES_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?s)(?P<base>.*?) #(?P<n>\d+)$").expect("valid regex"));

/// 去掉结尾的 " #<数字>" 得到系列基础标题
pub fn base_title(title: &str) -> &str {
    match SERIES_SUFFIX.captures(title) {
        Some(caps) => caps.name("base").map(|m| m.as_str()).unwrap_or(title),
        None => title,
    }
}

/// 标题中的期数，没有后缀时为 1
pub fn series_number(title: &str) -> u64 {
    SERIES_SUFFIX
        .captures(title)
        .and_then(|caps| caps.name("n"))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(1)
}

/// 在同系列现有标题中取最大期数 + 1，最小为 #2
pub fn next_series_title<'a, I>(base: &str, titles: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = titles
        .into_iter()
        .filter(|t| base_title(t) == base)
        .map(series_number)
        .max()
        .unwrap_or(1);
    format!("{} #{}", base, max.max(1).saturating_add(1))
}
