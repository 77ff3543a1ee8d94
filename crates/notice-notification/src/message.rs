//! 공시 리포트 포맷터.
//!
//! 두 종류의 메시지를 만듭니다:
//! - 공시 목록: 섹션(투자주의/단기과열/...)별로 당일 공시를 중복 제거·정렬해
//!   번호 목록으로 렌더링
//! - 기준가 다이제스트: 저장소의 당일 레코드에서 보조 가격 필드로
//!   지정 기준가를 되살려 블록 단위로 렌더링
//!
//! 빈 섹션은 통째로 생략되며, 보낼 내용이 전혀 없으면 다이제스트 자체가
//! `None` — 호출자는 전송을 건너뜁니다 (빈 리포트 스팸 방지).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use notice_core::category::{rule_for, section_rank, HIGH_ONLY_LABEL};
use notice_core::{notice, DesignationRecord};

/// 다이제스트 블록 내 가격 라인 출력 순서.
const DIGEST_LABEL_ORDER: [&str; 5] = [
    "초단기예고",
    "단기예고",
    "단기불건전예고",
    "장기예고",
    HIGH_ONLY_LABEL,
];

/// 원 단위 금액 포맷 (`12,345원`).
pub fn format_won(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{}원", grouped)
    } else {
        format!("{}원", grouped)
    }
}

fn cats_text(categories: &[String]) -> String {
    categories.join(", ")
}

fn item_line(n: usize, name: &str, code: &str, cats: &str) -> String {
    let name = if name.trim().is_empty() { "이름없음" } else { name.trim() };
    let code = if code.trim().is_empty() { "코드없음" } else { code.trim() };
    let cats = if cats.trim().is_empty() { "-" } else { cats.trim() };
    format!("{}. {}({}) - {}", n, name, code, cats)
}

/// 섹션 블록 렌더링.
///
/// `(종목명, 종목코드, 카테고리 문자열)` 기준으로 중복을 제거하고
/// 섹션 우선순위→종목명 순으로 정렬한 번호 목록. 비면 빈 문자열
/// (섹션 자체 생략).
pub fn build_section_block(title: &str, entries: &[Value]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut seen = std::collections::HashSet::new();
    let mut items: Vec<(usize, String, String, String)> = Vec::new();
    for item in entries {
        let name = notice::stock_name(item);
        let code = notice::stock_code(item);
        let cats = notice::categories(item);
        let text = cats_text(&cats);
        if !seen.insert((name.clone(), code.clone(), text.clone())) {
            continue;
        }
        items.push((section_rank(title, &cats), name, code, text));
    }
    items.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut lines = vec![format!("<b>▪️[{}] 관련 공시</b>", title), String::new()];
    for (idx, (_, name, code, text)) in items.iter().enumerate() {
        lines.push(item_line(idx + 1, name, code, text));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// 당일 공시 목록 메시지.
///
/// `sections`는 (섹션 제목, 당일 공시 항목들) 쌍 — 이미 당일 필터가
/// 적용된 상태로 받는다. 표시할 블록이 하나도 없으면 안내 문구로 대체.
pub fn build_notice_listing(base_ymd: &str, sections: &[(String, Vec<Value>)]) -> String {
    let header = format!("<b>📢 공시 목록 (키워드별 정렬) - {}</b>", base_ymd);
    let mut parts = vec![header.clone(), String::new()];
    let mut any_block = false;

    for (title, entries) in sections {
        let block = build_section_block(title, entries);
        if !block.is_empty() {
            parts.push(block);
            any_block = true;
        }
    }

    if !any_block {
        return format!("{}\n\n(표시할 공시가 없습니다)", header);
    }
    parts.join("\n").trim_end().to_string()
}

fn mul_trunc(value: Option<i64>, multiplier: Decimal) -> i64 {
    value
        .map(|v| (Decimal::from(v) * multiplier).trunc().to_i64().unwrap_or(0))
        .unwrap_or(0)
}

/// 투자경고 레코드의 다이제스트 블록.
///
/// 저장된 보조 필드(D-N 종가, 신고가)에서 카테고리별 기준가를 다시 계산해
/// 헤더 한 줄 + 가격 라인들로 구성. 헤더에는 첫 매칭 카테고리만 노출.
pub fn warning_block(rec: &DesignationRecord) -> Option<String> {
    let name = rec.stock_name.trim();
    let code = rec.stock_code.trim();
    if name.is_empty() || code.is_empty() || rec.categories.is_empty() {
        return None;
    }

    let matched: Vec<&str> = DIGEST_LABEL_ORDER
        .iter()
        .filter(|label| rec.categories.iter().any(|c| c.contains(**label)))
        .copied()
        .collect();
    let header_label = matched.first()?;

    let high = rec.high_price.unwrap_or(0);
    let mut lines = vec![format!("📌 <b>{}</b> ({}) | {}", name, code, header_label)];

    for label in &matched {
        let (price, tail) = match *label {
            "초단기예고" => (mul_trunc(rec.d3_price, rule_multiplier("초단기예고")).max(high), ""),
            "단기예고" => (mul_trunc(rec.d5_price, rule_multiplier("단기예고")).max(high), ""),
            "단기불건전예고" => (
                mul_trunc(rec.d5_45_price, rule_multiplier("단기불건전예고")).max(high),
                " + 소수계좌",
            ),
            "장기예고" => (mul_trunc(rec.d15_price, rule_multiplier("장기예고")).max(high), ""),
            HIGH_ONLY_LABEL => (high, " + 소수계좌"),
            _ => (0, ""),
        };
        if price > 0 {
            lines.push(format!("▸ 투자경고 기준가격: {}{}", format_won(price), tail));
        }
    }

    if lines.len() > 1 {
        Some(lines.join("\n"))
    } else {
        None
    }
}

fn rule_multiplier(label: &str) -> Decimal {
    rule_for(label).map(|r| r.multiplier).unwrap_or(Decimal::ONE)
}

/// 단기과열 레코드의 다이제스트 블록 (`first_price` 있는 항목만).
pub fn overheating_block(rec: &DesignationRecord) -> Option<String> {
    let name = rec.stock_name.trim();
    let code = rec.stock_code.trim();
    let price = rec.first_price.filter(|p| *p > 0)?;
    if name.is_empty() || code.is_empty() {
        return None;
    }
    Some(format!(
        "📌 <b>{}</b> ({}) | 단기과열\n▸ 단기과열 기준가격: {}",
        name,
        code,
        format_won(price)
    ))
}

/// 당일 기준가 다이제스트.
///
/// 단기과열 섹션 → 투자경고 섹션 순. 두 섹션 모두 비면 `None` —
/// 호출자는 전송을 생략한다.
pub fn build_price_digest(
    overheating_today: &[DesignationRecord],
    warning_today: &[DesignationRecord],
) -> Option<String> {
    let mut sections: Vec<String> = Vec::new();

    let oh_blocks: Vec<String> = overheating_today.iter().filter_map(overheating_block).collect();
    if !oh_blocks.is_empty() {
        sections.push(format!("<b>📊 단기과열 공시</b>\n\n{}", oh_blocks.join("\n\n")));
    }

    let warn_blocks: Vec<String> = warning_today.iter().filter_map(warning_block).collect();
    if !warn_blocks.is_empty() {
        sections.push(format!(
            "<b>📊 투자경고 기준가격 (당일 공시)</b>\n\n{}",
            warn_blocks.join("\n\n")
        ));
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}
