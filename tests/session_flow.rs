//! Integration tests for a complete reporting session.
//!
//! These tests run the session driver end to end:
//! 1. The period is elicited and confirmed
//! 2. Service info is read from the site export
//! 3. Columns are elicited and the page export is aggregated
//! 4. The report is streamed back to the operator
//!
//! The oracle is the scripted mock provider and the operator is a scripted
//! console; the CSV exports are temporary files.

use chrono::NaiveDate;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

use site_insight::adapters::{CsvTabularSource, MockAIProvider, ScriptedConsole};
use site_insight::application::prompts;
use site_insight::application::{
    ElicitationError, FetchAccessDataError, IdentifyPeriodError, RunSessionHandler, SessionError,
};
use site_insight::domain::elicitation::{Column, ColumnSelection, DateRange};
use site_insight::domain::foundation::SiteId;
use site_insight::domain::session::SessionContext;
use site_insight::ports::MessageRole;

// =============================================================================
// Test Infrastructure
// =============================================================================

const PAGES: &str = "\
date,ページタイトル,URL,訪問数,直帰率,平均滞在時間,CV数,CV率
2025-02-01,トップ,/,100,40%,0:01:00,2,2%
2025-02-10,料金,/price,50,20%,0:02:00,5,10%
2025-02-20,トップ,/,300,60%,0:03:00,4,1%
2025-03-01,トップ,/,999,99%,0:09:00,9,9%
";

const SITES: &str = "\
site_id,service,overview
111,Acme CRM,Cloud CRM for small teams
";

const REPORT: &str = "## February\n\nThe top page drew 400 visits.";

struct Fixture {
    _pages: NamedTempFile,
    _sites: NamedTempFile,
    source: Arc<CsvTabularSource>,
}

fn write(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn fixture() -> Fixture {
    let pages = write(PAGES);
    let sites = write(SITES);
    let source = Arc::new(CsvTabularSource::new(pages.path(), sites.path()));
    Fixture {
        _pages: pages,
        _sites: sites,
        source,
    }
}

fn context(site: &str) -> SessionContext {
    SessionContext::start(
        SiteId::new(site).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
    )
    .unwrap()
}

fn february() -> serde_json::Value {
    json!({"date_from": "2025-02-01", "date_to": "2025-02-28", "reasoning": "previous month"})
}

fn title_and_visits() -> serde_json::Value {
    json!({"columns": ["ページタイトル", "訪問数"], "reasoning": "asked for visits per page"})
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn session_produces_report_from_confirmed_fields() {
    let fixture = fixture();
    let provider = Arc::new(
        MockAIProvider::new()
            .with_json(february())
            .with_json(title_and_visits())
            .with_response(REPORT),
    );
    let handler = RunSessionHandler::new(provider.clone(), fixture.source.clone(), 5);
    let mut ctx = context("111");
    let mut console = ScriptedConsole::new(["先月のレポート", "y", "ページごとの訪問数", "y"]);

    handler.handle(&mut ctx, &mut console).await.unwrap();

    assert_eq!(
        ctx.date_range(),
        Some(&DateRange::parse("2025-02-01", "2025-02-28").unwrap())
    );
    assert_eq!(
        ctx.columns(),
        Some(&ColumnSelection::new([Column::PageTitle, Column::Visits]).unwrap())
    );
    assert!(ctx.service_info().unwrap().contains("Acme CRM"));
    assert_eq!(ctx.report(), Some(REPORT));
    assert_eq!(console.streamed_text(), REPORT);
    assert_eq!(console.remaining_answers(), 0);
    assert_eq!(provider.call_count(), 3);
    assert_eq!(
        console.notices()[0],
        format!("Session {} (site 111)", ctx.id().short())
    );

    // March rows are outside the period.
    let access = ctx.access_data().unwrap();
    assert!(access.contains("| トップ | 400 |"));
    assert!(access.contains("| 料金 | 50 |"));
    assert!(!access.contains("999"));
    assert!(access.contains("SQL: SELECT"));
}

#[tokio::test]
async fn report_request_carries_every_phase() {
    let fixture = fixture();
    let provider = Arc::new(
        MockAIProvider::new()
            .with_json(february())
            .with_json(title_and_visits())
            .with_response(REPORT),
    );
    let handler = RunSessionHandler::new(provider.clone(), fixture.source.clone(), 5);
    let mut ctx = context("111");
    let mut console = ScriptedConsole::new(["先月のレポート", "y", "ページごとの訪問数", "y"]);

    handler.handle(&mut ctx, &mut console).await.unwrap();

    let report_call = provider.get_calls().pop().unwrap();
    assert_eq!(report_call.metadata.purpose, "report");
    assert_eq!(report_call.metadata.session_id, ctx.id());
    assert!(report_call.response_format.is_none());

    let instruction = report_call.messages.last().unwrap();
    assert_eq!(instruction.role, MessageRole::System);
    assert!(instruction.content.contains("2025-02-01"));
    assert!(instruction.content.contains("Acme CRM"));
    assert!(instruction.content.contains("| トップ | 400 |"));

    // The operator's period request reached the report as part of the history.
    assert!(report_call
        .messages
        .iter()
        .any(|m| m.role == MessageRole::User && m.content == "先月のレポート"));
}

#[tokio::test]
async fn column_phase_does_not_see_period_history() {
    let fixture = fixture();
    let provider = Arc::new(
        MockAIProvider::new()
            .with_json(february())
            .with_json(title_and_visits())
            .with_response(REPORT),
    );
    let handler = RunSessionHandler::new(provider.clone(), fixture.source.clone(), 5);
    let mut ctx = context("111");
    let mut console = ScriptedConsole::new(["先月のレポート", "y", "ページごとの訪問数", "y"]);

    handler.handle(&mut ctx, &mut console).await.unwrap();

    let column_call = &provider.get_calls()[1];
    assert_eq!(column_call.messages.len(), 2);
    assert_eq!(column_call.messages[1].content, "ページごとの訪問数");
    assert!(!column_call
        .messages
        .iter()
        .any(|m| m.content.contains("先月")));
}

// =============================================================================
// Degraded paths
// =============================================================================

#[tokio::test]
async fn unknown_site_continues_without_service_info() {
    let fixture = fixture();
    let provider = Arc::new(
        MockAIProvider::new()
            .with_json(february())
            .with_json(title_and_visits())
            .with_response(REPORT),
    );
    let handler = RunSessionHandler::new(provider.clone(), fixture.source.clone(), 5);
    let mut ctx = context("999");
    let mut console = ScriptedConsole::new(["2月", "y", "訪問数", "y"]);

    handler.handle(&mut ctx, &mut console).await.unwrap();

    assert_eq!(ctx.service_info(), None);
    assert_eq!(ctx.report(), Some(REPORT));
    let instruction = provider.get_calls()[2].messages.last().cloned().unwrap();
    assert!(instruction.content.contains("no service information available"));
}

#[tokio::test]
async fn period_exhaustion_ends_session_and_keeps_history() {
    let fixture = fixture();
    let mut provider = MockAIProvider::new();
    for _ in 0..3 {
        provider = provider.with_json(
            json!({"date_from": "2025-03-10", "date_to": "2025-02-01", "reasoning": "guess"}),
        );
    }
    let provider = Arc::new(provider);
    let handler = RunSessionHandler::new(provider.clone(), fixture.source.clone(), 3);
    let mut ctx = context("111");
    let before = ctx.history().clone();
    let mut console = ScriptedConsole::new(["いつもの期間"]);

    let err = handler.handle(&mut ctx, &mut console).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Period(IdentifyPeriodError::Elicitation(
            ElicitationError::Exhausted { attempts: 3, .. }
        ))
    ));
    assert_eq!(provider.call_count(), 3);
    assert_eq!(ctx.history(), &before);
    assert_eq!(ctx.date_range(), None);
    assert_eq!(ctx.report(), None);
}

#[tokio::test]
async fn missing_page_export_fails_access_phase_after_period() {
    let sites = write(SITES);
    let source = Arc::new(CsvTabularSource::new("/nonexistent/pages.csv", sites.path()));
    let provider = Arc::new(
        MockAIProvider::new()
            .with_json(february())
            .with_json(title_and_visits()),
    );
    let handler = RunSessionHandler::new(provider, source, 5);
    let mut ctx = context("111");
    let mut console = ScriptedConsole::new(["2月", "y", "訪問数", "y"]);

    let err = handler.handle(&mut ctx, &mut console).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::AccessData(FetchAccessDataError::Source(_))
    ));
    // Earlier phases keep what they stored.
    assert!(ctx.date_range().is_some());
    assert!(ctx.service_info().is_some());
    assert_eq!(ctx.access_data(), None);
}

#[tokio::test]
async fn operator_leaving_during_columns_ends_session() {
    let fixture = fixture();
    let provider = Arc::new(MockAIProvider::new().with_json(february()));
    let handler = RunSessionHandler::new(provider, fixture.source.clone(), 5);
    let mut ctx = context("111");
    let mut console = ScriptedConsole::new(["2月", "y"]);

    let err = handler.handle(&mut ctx, &mut console).await.unwrap_err();

    assert!(matches!(err, SessionError::AccessData(_)));
    assert_eq!(console.prompts().last().copied(), Some(prompts::COLUMNS_QUESTION));
}
