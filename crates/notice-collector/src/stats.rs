//! 단계별 실행 통계/리포트.

/// 기준가 계산 단계 통계
#[derive(Debug, Clone, Default)]
pub struct CalcStats {
    /// 당일 공시 대상 종목 수
    pub targets: usize,
    /// 레코드가 생성된 종목 수
    pub computed: usize,
    /// 규칙 없음/스킵 분류 등으로 제외된 수
    pub skipped: usize,
    /// 시세 데이터가 없어 제외된 수
    pub no_data: usize,
    /// 업서트 후 저장소 총 레코드 수
    pub store_total: usize,
}

impl CalcStats {
    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            targets = self.targets,
            computed = self.computed,
            skipped = self.skipped,
            no_data = self.no_data,
            store_total = self.store_total,
            "계산 완료"
        );
    }
}

/// 보조필드 갱신 단계 통계
#[derive(Debug, Clone, Default)]
pub struct RefreshStats {
    /// 갱신된 레코드 수
    pub updated: usize,
    /// 건너뛴 레코드 수
    pub skipped: usize,
}

impl RefreshStats {
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            updated = self.updated,
            skipped = self.skipped,
            "갱신 완료"
        );
    }
}

/// 단계 실행 결과
#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// 정상 완료
    Completed,
    /// 실행 조건 미충족으로 건너뜀
    Skipped(String),
    /// 실패 (실행은 계속됨)
    Failed(String),
}

/// 한 단계의 상태
#[derive(Debug, Clone)]
pub struct StageStatus {
    pub stage: &'static str,
    pub outcome: StageOutcome,
}

/// 한 번의 실행에 대한 단계별 리포트.
///
/// 서브프로세스 종료 코드 대신 단계 결과를 값으로 모아
/// 실행 말미에 한 번에 요약한다.
#[derive(Debug)]
pub struct RunReport {
    pub base_ymd: String,
    pub stages: Vec<StageStatus>,
}

impl RunReport {
    pub fn new(base_ymd: impl Into<String>) -> Self {
        Self {
            base_ymd: base_ymd.into(),
            stages: Vec::new(),
        }
    }

    /// 단계 결과 기록
    pub fn record(&mut self, stage: &'static str, outcome: StageOutcome) {
        match &outcome {
            StageOutcome::Completed => tracing::info!(stage = stage, "단계 완료"),
            StageOutcome::Skipped(reason) => {
                tracing::info!(stage = stage, reason = %reason, "단계 건너뜀")
            }
            StageOutcome::Failed(reason) => {
                tracing::error!(stage = stage, reason = %reason, "단계 실패 — 계속 진행")
            }
        }
        self.stages.push(StageStatus { stage, outcome });
    }

    /// 실패한 단계 수
    pub fn failed_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s.outcome, StageOutcome::Failed(_)))
            .count()
    }

    /// 실행 전체 요약 로그
    pub fn log_summary(&self) {
        tracing::info!(
            base_date = %self.base_ymd,
            total = self.stages.len(),
            failed = self.failed_count(),
            "실행 요약"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_count() {
        let mut report = RunReport::new("20250926");
        report.record("a", StageOutcome::Completed);
        report.record("b", StageOutcome::Failed("시세 없음".to_string()));
        report.record("c", StageOutcome::Skipped("대상 없음".to_string()));

        assert_eq!(report.stages.len(), 3);
        assert_eq!(report.failed_count(), 1);
    }
}
