use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Handle;

use editflow::cli::{CliArgs, RunConfig};
use editflow::debug_dump::SessionDump;
use editflow::editable::{EditState, Line};
use editflow::search::{
    load_label, trigger_refilter, FilterEngine, FilterRequest, FilterView, KeywordMatcher,
    ScanStrategy, SearchSession,
};
use editflow::{EditorConfig, EditorSession};

#[tokio::main]
async fn main() -> Result<()> {
    editflow::tracing::init();

    let config = EditorConfig::load();
    let run = CliArgs::parse().into_config(&config);

    let text = std::fs::read_to_string(&run.file)
        .with_context(|| format!("Failed to read {}", run.file.display()))?;
    let session = EditorSession::new(EditState::from_text(&text), config.history_capacity);
    tracing::info!(
        "{}: loaded {} ({} lines)",
        session.id(),
        run.file.display(),
        session.current().line_count()
    );

    let mut engine = FilterEngine::new(
        Handle::current(),
        SearchSession::new(config.search_token_len),
        config.filter.track_list_size,
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_lines(&mut engine, &session, &run, &mut out).await?;

    if run.dump {
        let dump = SessionDump::capture(&session).await;
        writeln!(out, "{}", dump.to_json().context("Failed to serialize dump")?)?;
    }

    Ok(())
}

async fn print_lines(
    engine: &mut FilterEngine<Line>,
    session: &EditorSession,
    run: &RunConfig,
    out: &mut impl Write,
) -> Result<()> {
    let lines = session.current().shared_content();
    let mut matcher = KeywordMatcher::new(&run.keyword, run.match_mode, run.ignore_case);
    let strategy = ScanStrategy::matching(move |_, line: &Line| matcher.matches(&line.text));

    let refresh_id = trigger_refilter();
    let request = FilterRequest::new(&run.keyword, &refresh_id).filter_on(run.filtering());
    let refresh = engine.refresh(request, lines, strategy);

    if let Some(scan) = refresh.scan {
        let outcome = scan.await.context("Filter scan failed")?;
        tracing::debug!("Scan finished: {:?}", outcome);
    }

    let count = match &refresh.view {
        FilterView::Unfiltered(lines) => {
            for (idx, line) in lines.iter().enumerate() {
                writeln!(out, "{:>6}  {}", idx + 1, line.text)?;
            }
            lines.len()
        }
        FilterView::Filtered(results) => {
            let items = results.snapshot();
            for (idx, line) in results.indices().into_iter().zip(items.iter()) {
                writeln!(out, "{:>6}  {}", idx + 1, line.text)?;
            }
            items.len()
        }
    };

    if let Some(label) = load_label(count, refresh.view.is_filtered()) {
        writeln!(out, "-- {}", label)?;
    }
    Ok(())
}
