//! `revline dedupe` - interactive duplicate resolution against curated records

use std::io::{BufRead, Write};

use anyhow::Result;
use clap::Args;
use revline_core::{ProgressContext, RecordArena};
use revline_dedupe::{
    apply, plan, run_session, ApplySummary, DecisionRequest, DecisionResponse, DedupeError,
    DedupeOutcome, DedupeScope, DedupeSession, Prompter, SourceMergeReport,
};
use revline_store::CommitInfo;

use super::Project;

#[derive(Args, Debug)]
pub struct DedupeArgs {
    /// Offer every record not yet processed, not only prepared ones
    #[arg(long)]
    pub force: bool,

    /// Candidates shown per record (default from settings.toml)
    #[arg(long)]
    pub max_candidates: Option<usize>,
}

/// Parse one line of operator input. `None` means "ask again".
pub fn parse_response(input: &str) -> Option<DecisionResponse> {
    match input.trim().to_lowercase().as_str() {
        "" | "s" => Some(DecisionResponse::Skip),
        "a" => Some(DecisionResponse::AddAsNew),
        "p" => Some(DecisionResponse::SendToPreparation),
        "q" => Some(DecisionResponse::Quit),
        other => other.parse().ok().map(DecisionResponse::Duplicate),
    }
}

/// Prompts on `output`, reads answers line by line from `input`.
/// End of input quits.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn show(&mut self, request: &DecisionRequest) -> std::io::Result<()> {
        let out = &mut self.output;
        writeln!(out)?;
        writeln!(
            out,
            "[{}/{}] {} ({})",
            request.position, request.total, request.record.id, request.record.status
        )?;
        writeln!(out, "      {}", request.record.citation)?;
        for candidate in &request.candidates {
            let mark = if candidate.highlighted { '*' } else { ' ' };
            writeln!(
                out,
                "  {:>2} {mark} {:.2}  {} ({})",
                candidate.index, candidate.similarity, candidate.record.id, candidate.record.status
            )?;
            writeln!(out, "            {}", candidate.record.citation)?;
        }
        Ok(())
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                log::warn!("failed to read input: {e}");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn decide(&mut self, request: &DecisionRequest) -> DecisionResponse {
        if let Err(e) = self.show(request) {
            log::warn!("failed to write prompt: {e}");
            return DecisionResponse::Quit;
        }
        let n = request.candidates.len();
        loop {
            let _ = write!(
                self.output,
                "duplicate of [1-{n}], (s)kip, (a)dd as new, (p)reparation, (q)uit: "
            );
            let _ = self.output.flush();
            let Some(line) = self.read_line() else {
                return DecisionResponse::Quit;
            };
            match parse_response(&line) {
                Some(response) => return response,
                None => {
                    let _ = writeln!(self.output, "unrecognized input: {}", line.trim());
                }
            }
        }
    }

    fn rejected(&mut self, error: &DedupeError) {
        let _ = writeln!(self.output, "{error}");
    }
}

/// Apply every decision of the session and persist them in one commit.
/// `arena` is only replaced once the commit succeeded.
fn persist_outcome(
    project: &mut Project,
    arena: &mut RecordArena,
    outcome: &DedupeOutcome,
    preferred_sources: &[String],
) -> Result<Option<(ApplySummary, CommitInfo)>> {
    let mut work = arena.clone();
    let summary = apply(&mut work, outcome, preferred_sources)?;
    if !summary.merges_changed() && summary.added_as_new.is_empty() {
        return Ok(None);
    }
    let commit = project.commit(Some(&work), &[], "Dedupe records")?;
    *arena = work;
    Ok(Some((summary, commit)))
}

pub fn run(args: DedupeArgs, project: &mut Project, progress: &ProgressContext) -> Result<()> {
    let mut settings = project.settings.dedupe.clone();
    if args.force {
        settings.scope = DedupeScope::NotProcessed;
    }
    if let Some(n) = args.max_candidates {
        settings.max_candidates = n;
    }

    let mut arena = project.load_records()?;
    let spinner = progress.stage_line("dedupe");
    let plan = plan(&arena, &settings);
    spinner.finish_and_clear();

    if !plan.not_toc_identifiable.is_empty() {
        log::warn!(
            "{} records cannot be matched by table of contents and are skipped",
            plan.not_toc_identifiable.len()
        );
    }
    log::info!(
        "{} records to decide, {} without candidates",
        plan.items.len(),
        plan.no_candidates.len()
    );

    let session = DedupeSession::new(&arena, &plan)?;
    let stdin = std::io::stdin();
    let mut prompter = TerminalPrompter::new(stdin.lock(), std::io::stderr());
    let outcome = run_session(session, &mut prompter);
    if outcome.quit {
        log::info!("dedupe stopped early, applying the decisions made so far");
    }
    if outcome.is_empty() {
        eprintln!("No decisions to apply.");
        return Ok(());
    }

    match persist_outcome(project, &mut arena, &outcome, &settings.preferred_sources)? {
        Some((summary, commit)) => eprintln!(
            "Merged {} duplicates, {} added as new, {} sent to preparation (commit {})",
            summary.merged.len(),
            summary.added_as_new.len(),
            summary.sent_to_preparation.len(),
            commit.id
        ),
        None => eprintln!("Decisions did not change any record."),
    }

    let report = SourceMergeReport::from_arena(&arena);
    let written = report.export(&arena, &project.root().join("dedupe"))?;
    for path in written {
        eprintln!("Records waiting for merge: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use revline_core::{Record, RecordState};
    use revline_dedupe::{DedupeSettings, MergeDecision};
    use revline_store::{Dataset, DatasetGateway};

    use crate::settings::ProjectSettings;

    #[test]
    fn parse_keys() {
        assert_eq!(parse_response("2\n"), Some(DecisionResponse::Duplicate(2)));
        assert_eq!(parse_response("\n"), Some(DecisionResponse::Skip));
        assert_eq!(parse_response("A"), Some(DecisionResponse::AddAsNew));
        assert_eq!(parse_response("p"), Some(DecisionResponse::SendToPreparation));
        assert_eq!(parse_response("q"), Some(DecisionResponse::Quit));
        assert_eq!(parse_response("maybe"), None);
    }

    fn issue(id: &str, status: RecordState) -> Record {
        Record::new(id, status)
            .with_field("title", "Digital Work")
            .with_field("journal", "X")
            .with_field("volume", "1")
            .with_field("number", "1")
    }

    #[test]
    fn terminal_prompter_reprompts_and_quits_on_eof() {
        let mut arena = RecordArena::new();
        arena.insert(issue("R1", RecordState::MdPrepared)).unwrap();
        arena.insert(issue("R2", RecordState::MdProcessed)).unwrap();
        let plan = plan(&arena, &DedupeSettings::default());

        // "x" is unrecognized, "5" is out of range, then a valid choice
        let input = b"x\n5\n1\n".as_slice();
        let mut output = Vec::new();
        let outcome = {
            let mut prompter = TerminalPrompter::new(input, &mut output);
            run_session(DedupeSession::new(&arena, &plan).unwrap(), &mut prompter)
        };
        assert_eq!(outcome.decisions.len(), 1);
        assert!(!outcome.quit);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("[1/1] R1"));
        assert!(shown.contains("unrecognized input: x"));

        let mut prompter = TerminalPrompter::new(b"".as_slice(), Vec::new());
        let outcome = run_session(DedupeSession::new(&arena, &plan).unwrap(), &mut prompter);
        assert!(outcome.quit);
        assert!(outcome.decisions.is_empty());
    }

    fn project_with(arena: &RecordArena) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::init(dir.path(), "Reviewer").unwrap();
        dataset.save_records(arena).unwrap();
        dataset.create_commit("Seed records").unwrap();
        let project = Project {
            dataset,
            settings: ProjectSettings::default(),
        };
        (dir, project)
    }

    fn merge_and_add() -> (RecordArena, DedupeOutcome) {
        let mut arena = RecordArena::new();
        arena.insert(issue("R1", RecordState::MdPrepared)).unwrap();
        arena.insert(issue("R2", RecordState::MdProcessed)).unwrap();
        arena.insert(issue("R3", RecordState::MdPrepared)).unwrap();
        let outcome = DedupeOutcome {
            decisions: vec![MergeDecision::duplicate("R2", "R1")],
            add_as_new: vec!["R3".to_string()],
            ..Default::default()
        };
        (arena, outcome)
    }

    #[test]
    fn failed_save_keeps_every_decision_off_disk() {
        let (mut arena, outcome) = merge_and_add();
        let (_dir, mut project) = project_with(&arena);
        let before = arena.clone();

        // A directory where the temp file should go makes the save fail
        std::fs::create_dir(project.dataset.records_path().with_extension("json.tmp")).unwrap();
        assert!(persist_outcome(&mut project, &mut arena, &outcome, &[]).is_err());
        assert_eq!(arena, before);

        let on_disk = project.load_records().unwrap();
        assert_eq!(on_disk.get("R1").unwrap().status(), RecordState::MdPrepared);
        assert_eq!(on_disk.get("R3").unwrap().status(), RecordState::MdPrepared);
        assert_eq!(project.dataset.log().unwrap().len(), 1);
    }

    #[test]
    fn merges_and_additions_share_one_commit() {
        let (mut arena, outcome) = merge_and_add();
        let (_dir, mut project) = project_with(&arena);

        let (summary, _) = persist_outcome(&mut project, &mut arena, &outcome, &[])
            .unwrap()
            .unwrap();
        assert_eq!(summary.merged, vec![("R2".to_string(), "R1".to_string())]);
        assert_eq!(summary.added_as_new, vec!["R3"]);

        let on_disk = project.load_records().unwrap();
        assert!(on_disk.get("R1").is_err());
        assert_eq!(on_disk.get("R3").unwrap().status(), RecordState::MdProcessed);
        assert_eq!(project.dataset.log().unwrap().len(), 2);
    }
}
