//! 공시 JSON에서 당일 대상 종목 추출.

use serde_json::Value;

use notice_core::notice;

/// 기준가 계산 대상 한 건.
#[derive(Debug, Clone)]
pub struct NoticeTarget {
    pub stock_code: String,
    pub stock_name: String,
    pub categories: Vec<String>,
}

/// 당일 공시에서 대상 종목 수집.
///
/// 종목코드는 숫자열만 인정. `dedupe_by_code`가 켜지면 같은 코드는 첫 건만
/// 남긴다 (투자경고 경로). 단기과열 경로는 중복을 그대로 두고 업서트 키가
/// 카테고리까지 포함하므로 저장 단계에서 자연히 합쳐진다.
pub fn collect_targets(notices: &[Value], base_ymd: &str, dedupe_by_code: bool) -> Vec<NoticeTarget> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for item in notices {
        if !notice::is_same_day(item, base_ymd) {
            continue;
        }
        let code = notice::stock_code(item);
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if dedupe_by_code && !seen.insert(code.clone()) {
            continue;
        }
        out.push(NoticeTarget {
            stock_code: code,
            stock_name: notice::stock_name(item),
            categories: notice::categories(item),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notices() -> Vec<Value> {
        vec![
            json!({ "stock_code": "000880", "stock_name": "한화", "categories": ["초단기예고"], "date": "2025-09-26" }),
            json!({ "stock_code": "000880", "stock_name": "한화", "categories": ["단기예고"], "date": "2025-09-26" }),
            json!({ "stock_code": "111110", "stock_name": "어제종목", "categories": ["단기예고"], "date": "2025-09-25" }),
            json!({ "stock_code": "A1234", "stock_name": "코드이상", "categories": ["단기예고"], "date": "2025-09-26" }),
        ]
    }

    #[test]
    fn test_collect_dedupes_first_wins() {
        let targets = collect_targets(&notices(), "20250926", true);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].stock_code, "000880");
        assert_eq!(targets[0].categories, vec!["초단기예고".to_string()]);
    }

    #[test]
    fn test_collect_without_dedupe_keeps_all_today() {
        let targets = collect_targets(&notices(), "20250926", false);
        assert_eq!(targets.len(), 2);
    }
}
