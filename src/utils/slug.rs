use deunicode::deunicode;
use md5::{Digest, Md5};
use regex::Regex;
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// 无法转写出任何字母数字时使用的前缀
const FALLBACK_PREFIX: &str = "topic-";

/// 把研究主题规整为 slug，用作缓存键和归档文件名
///
/// 非ASCII字符先转写为ASCII（`Énergie` -> `energie`，中文转为拼音），再小写化，
/// 非字母数字字符折叠为单个 `-`，去掉首尾的 `-`。结果为空时退回到
/// `topic-<md5前12位>`，保证不同主题不会共用空键。
pub fn normalize_topic(topic: &str) -> String {
    let trimmed = topic.trim();
    let lowered = deunicode(trimmed).to_lowercase();
    let slug = NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();

    if !slug.is_empty() {
        return slug;
    }

    let mut hasher = Md5::new();
    hasher.update(trimmed.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}{}", FALLBACK_PREFIX, &digest[..12])
}
