//! 지정 공시 파이프라인 CLI.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notice_collector::modules::{self, digest};
use notice_collector::stats::{RunReport, StageOutcome};
use notice_collector::{CollectorConfig, Result};
use notice_core::TradingCalendar;
use notice_exchange::{CachedPriceProvider, KisClient, KisCredentials};
use notice_notification::TelegramSender;

type Provider = CachedPriceProvider<KisClient>;

/// 실행 게이트: 휴장일이면 false.
/// 영업일 확인 자체가 실패해도 휴장 취급 — 작업/전송 모두 생략한다.
async fn business_day_gate(cal: &dyn TradingCalendar, base_ymd: &str) -> bool {
    match cal.is_business_day(base_ymd).await {
        Ok(true) => true,
        Ok(false) => {
            tracing::info!(base_date = %base_ymd, "휴장일 — 작업을 종료합니다");
            false
        }
        Err(e) => {
            tracing::warn!(base_date = %base_ymd, "영업일 확인 실패 — 작업 생략: {}", e);
            false
        }
    }
}

/// 전체 파이프라인: 기준가 계산 → 보조필드 갱신 → 다이제스트 전송.
///
/// 각 단계의 실패는 기록만 하고 다음 단계로 계속 진행한다.
async fn run_all(provider: &Provider, config: &CollectorConfig, base_ymd: &str) -> Result<()> {
    if !business_day_gate(provider, base_ymd).await {
        return Ok(());
    }

    let mut report = RunReport::new(base_ymd);

    match modules::calc_warning_prices(provider, provider, config, base_ymd).await {
        Ok(stats) => {
            stats.log_summary("투자경고 기준가 계산");
            report.record("warning-calc", StageOutcome::Completed);
        }
        Err(e) => report.record("warning-calc", StageOutcome::Failed(e.to_string())),
    }

    match modules::refresh_warning_aux(provider, config, base_ymd).await {
        Ok(stats) => {
            stats.log_summary("투자경고 보조필드 갱신");
            report.record("warning-refresh", StageOutcome::Completed);
        }
        Err(e) => report.record("warning-refresh", StageOutcome::Failed(e.to_string())),
    }

    match modules::calc_overheating_prices(provider, provider, config, base_ymd).await {
        Ok(stats) => {
            stats.log_summary("단기과열 기준가 계산");
            report.record("overheating-calc", StageOutcome::Completed);
        }
        Err(e) => report.record("overheating-calc", StageOutcome::Failed(e.to_string())),
    }

    match modules::refresh_overheating_aux(provider, config, base_ymd).await {
        Ok(stats) => {
            stats.log_summary("단기과열 보조필드 갱신");
            report.record("overheating-refresh", StageOutcome::Completed);
        }
        Err(e) => report.record("overheating-refresh", StageOutcome::Failed(e.to_string())),
    }

    match digest::build_digest_message(config, base_ymd) {
        Some(message) => {
            println!("{}", message);
            match TelegramSender::from_env() {
                Some(sender) => match sender.send(&message).await {
                    Ok(()) => report.record("digest-send", StageOutcome::Completed),
                    Err(e) => report.record("digest-send", StageOutcome::Failed(e.to_string())),
                },
                None => report.record(
                    "digest-send",
                    StageOutcome::Skipped("텔레그램 미설정".to_string()),
                ),
            }
        }
        // 빈 리포트는 보내지 않는다 (스팸 방지)
        None => report.record(
            "digest-send",
            StageOutcome::Skipped("전송 대상 없음".to_string()),
        ),
    }

    report.log_summary();
    Ok(())
}

/// 당일 공시 목록 메시지 전송.
async fn run_notices(provider: &Provider, config: &CollectorConfig, base_ymd: &str) -> Result<()> {
    if !business_day_gate(provider, base_ymd).await {
        return Ok(());
    }

    let message = digest::build_listing_message(config, base_ymd);
    println!("{}", message);

    match TelegramSender::from_env() {
        Some(sender) => {
            if let Err(e) = sender.send(&message).await {
                tracing::warn!("공시 목록 전송 실패: {}", e);
            }
        }
        None => tracing::info!("텔레그램 미설정 — 전송 생략"),
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "notice-collector")]
#[command(about = "KRX designation notice pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 전체 워크플로우 실행 (투자경고 → 갱신 → 단기과열 → 갱신 → 다이제스트)
    RunAll {
        /// 기준일 오버라이드 (예: 20250926, 2025-09-26)
        date: Option<String>,
    },

    /// 투자경고 기준가 계산 + 업서트
    WarningCalc {
        /// 기준일 오버라이드
        date: Option<String>,
    },

    /// 단기과열 기준가 기록 + 업서트
    OverheatingCalc {
        /// 기준일 오버라이드
        date: Option<String>,
    },

    /// 투자경고 저장소 과거 레코드 보조필드 갱신
    RefreshWarning,

    /// 단기과열 저장소 전 레코드 전일 종가 갱신
    RefreshOverheating,

    /// 당일 공시 목록 메시지 전송
    Notices {
        /// 기준일 오버라이드
        date: Option<String>,
    },

    /// 당일 기준가 다이제스트 전송 (계산 없이 저장소만 읽음)
    Digest {
        /// 기준일 오버라이드
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "notice_collector={},notice_exchange={},notice_notification={}",
                    cli.log_level, cli.log_level, cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CollectorConfig::from_env();
    let credentials = KisCredentials::from_env()?;
    let client = KisClient::new(credentials, config.token_cache_path())?;
    // 실행 단위 시세 캐시 — 프로세스 수명과 함께 버려진다
    let provider = CachedPriceProvider::new(client);

    match cli.command {
        Commands::RunAll { date } => {
            let base_ymd = config.resolve_base_date(date.as_deref());
            tracing::info!(base_date = %base_ymd, "전체 워크플로우 시작");
            run_all(&provider, &config, &base_ymd).await?;
        }
        Commands::WarningCalc { date } => {
            let base_ymd = config.resolve_base_date(date.as_deref());
            let stats =
                modules::calc_warning_prices(&provider, &provider, &config, &base_ymd).await?;
            stats.log_summary("투자경고 기준가 계산");
        }
        Commands::OverheatingCalc { date } => {
            let base_ymd = config.resolve_base_date(date.as_deref());
            let stats =
                modules::calc_overheating_prices(&provider, &provider, &config, &base_ymd).await?;
            stats.log_summary("단기과열 기준가 계산");
        }
        Commands::RefreshWarning => {
            let base_ymd = config.resolve_base_date(None);
            let stats = modules::refresh_warning_aux(&provider, &config, &base_ymd).await?;
            stats.log_summary("투자경고 보조필드 갱신");
        }
        Commands::RefreshOverheating => {
            let base_ymd = config.resolve_base_date(None);
            let stats = modules::refresh_overheating_aux(&provider, &config, &base_ymd).await?;
            stats.log_summary("단기과열 보조필드 갱신");
        }
        Commands::Notices { date } => {
            let base_ymd = config.resolve_base_date(date.as_deref());
            run_notices(&provider, &config, &base_ymd).await?;
        }
        Commands::Digest { date } => {
            let base_ymd = config.resolve_base_date(date.as_deref());
            match digest::build_digest_message(&config, &base_ymd) {
                Some(message) => {
                    println!("{}", message);
                    if let Some(sender) = TelegramSender::from_env() {
                        sender.send(&message).await?;
                    } else {
                        tracing::info!("텔레그램 미설정 — 전송 생략");
                    }
                }
                None => println!("전송 대상 없음 ({})", base_ymd),
            }
        }
    }

    Ok(())
}
