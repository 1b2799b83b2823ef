use chrono::{DateTime, Utc};

use crate::app::{AppContext, Result};
use crate::fetcher::{self, Delta};
use crate::pipeline::ItemOutcome;

/// Tally of one sync run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The remote had nothing newer than the last import.
    pub up_to_date: bool,
    pub fetched: usize,
    pub written: usize,
    pub already_existed: usize,
    pub dry_run: usize,
    pub failed: usize,
    /// `last_import` was persisted at the end of the run.
    pub state_saved: bool,
}

/// Pull new bookmarks into the output directory.
pub fn sync(ctx: &AppContext) -> Result<SyncReport> {
    sync_at(ctx, Utc::now())
}

/// [`sync`] with an explicit notion of "now", used as the start of the
/// window when nothing was imported before.
pub fn sync_at(ctx: &AppContext, now: DateTime<Utc>) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    let remote_last_modified = ctx.fetcher.last_modified()?;

    let (since, until) = match fetcher::plan(ctx.state.last_import, remote_last_modified, now) {
        Delta::UpToDate { since } => {
            tracing::info!("No update necessary.");
            report.up_to_date = true;
            if ctx.state.last_import.is_none() {
                // Anchor the window, otherwise it would start at "now" forever.
                report.state_saved = persist(ctx, since)?;
            }
            return Ok(report);
        }
        Delta::Fetch { since, until } => (since, until),
    };

    let bookmarks = ctx.fetcher.fetch_since(since)?;
    report.fetched = bookmarks.len();
    tracing::info!("New bookmarks: {}", bookmarks.len());

    for bookmark in &bookmarks {
        let outcome = ctx.pipeline.process(bookmark);
        match &outcome {
            ItemOutcome::Written(_) => report.written += 1,
            ItemOutcome::AlreadyExists(_) => report.already_existed += 1,
            ItemOutcome::DryRun(_) => report.dry_run += 1,
            ItemOutcome::RenderFailed { .. } | ItemOutcome::WriteFailed { .. } => {
                report.failed += 1
            }
        }
        if outcome.is_failure() {
            tracing::warn!("{} ({})", outcome, bookmark.display_title());
        } else {
            tracing::info!("{}", outcome);
        }
    }

    if report.failed == 0 {
        report.state_saved = persist(ctx, until)?;
    } else {
        tracing::warn!(
            "{} of {} bookmarks failed; they will be retried on the next run",
            report.failed,
            report.fetched
        );
        if ctx.state.last_import.is_none() {
            report.state_saved = persist(ctx, since)?;
        }
    }

    tracing::info!(
        "Sync complete: {} written, {} already existed, {} failed",
        report.written,
        report.already_existed,
        report.failed
    );
    Ok(report)
}

/// Save `last_import = at`, unless in debug mode. Returns whether it saved.
fn persist(ctx: &AppContext, at: DateTime<Utc>) -> Result<bool> {
    if ctx.pipeline.is_debug() {
        tracing::debug!("Debug mode, not saving last import {}", at.to_rfc3339());
        return Ok(false);
    }
    ctx.store.save(&ctx.state.advanced_to(at))?;
    tracing::debug!("Last import set to {}", at.to_rfc3339());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PindownError;
    use crate::config::RunConfig;
    use crate::domain::Bookmark;
    use crate::fetcher::Fetcher;
    use crate::store::{FileStateStore, StateStore};
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// In-memory remote that records the windows it was asked for.
    struct FakeFetcher {
        last_modified: DateTime<Utc>,
        bookmarks: Vec<Bookmark>,
        requests: Rc<RefCell<Vec<DateTime<Utc>>>>,
    }

    impl Fetcher for FakeFetcher {
        fn last_modified(&self) -> Result<DateTime<Utc>> {
            Ok(self.last_modified)
        }

        fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Bookmark>> {
            self.requests.borrow_mut().push(since);
            Ok(self
                .bookmarks
                .iter()
                .filter(|b| b.created_at >= since)
                .cloned()
                .collect())
        }
    }

    struct Fixture {
        dir: TempDir,
        config: RunConfig,
    }

    impl Fixture {
        fn new(state: &str) -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join("out")).unwrap();
            fs::write(dir.path().join("state.toml"), state).unwrap();
            fs::write(dir.path().join("stopwords.txt"), "the\n").unwrap();

            let mut config = RunConfig::new(dir.path().join("out"), dir.path().join("state.toml"));
            config.stopwords_path = dir.path().join("stopwords.txt");
            config.template_path = dir.path().join("template.md");
            Self { dir, config }
        }

        fn context(
            &self,
            last_modified: DateTime<Utc>,
            bookmarks: Vec<Bookmark>,
        ) -> (AppContext, Rc<RefCell<Vec<DateTime<Utc>>>>) {
            let store = FileStateStore::new(&self.config.state_path);
            let state = store.load().unwrap();
            let requests = Rc::new(RefCell::new(Vec::new()));
            let fetcher = FakeFetcher {
                last_modified,
                bookmarks,
                requests: requests.clone(),
            };
            let ctx =
                AppContext::with_parts(&self.config, state, Box::new(store), Box::new(fetcher));
            (ctx, requests)
        }

        fn out(&self) -> &Path {
            &self.config.output_dir
        }

        fn output_files(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(self.out())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }

        fn state_file(&self) -> String {
            fs::read_to_string(&self.config.state_path).unwrap()
        }

        fn last_import(&self) -> Option<DateTime<Utc>> {
            FileStateStore::new(&self.config.state_path)
                .load()
                .unwrap()
                .last_import
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn bookmark(description: &str, created_at: DateTime<Utc>) -> Bookmark {
        let mut b = Bookmark::new("https://example.com/fox", description, created_at);
        b.tags = vec!["animals".into()];
        b
    }

    const STATE: &str = "api_token = \"u:t\"\nlocal_tz = \"UTC\"\nlast_import = \"2024-01-01T00:00:00Z\"\n";

    #[test]
    fn test_quick_fox_scenario() {
        let fx = Fixture::new(STATE);
        let (ctx, requests) = fx.context(day(5), vec![bookmark("The  Quick, Fox!", day(3))]);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert_eq!(report.fetched, 1);
        assert_eq!(report.written, 1);
        assert!(report.state_saved);
        assert_eq!(*requests.borrow(), vec![day(1)]);
        assert_eq!(fx.output_files(), vec!["quick-fox.md"]);

        let content = fs::read_to_string(fx.out().join("quick-fox.md")).unwrap();
        assert!(content.starts_with("Title: The  Quick, Fox!\nCategory: linklist\n"));
        assert!(content.contains("Date: 2024-01-03T00:00:00+00:00\n"));
        assert!(content.contains("Tags: animals\n"));
        assert_eq!(fx.last_import(), Some(day(5)));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let fx = Fixture::new(STATE);
        let items = vec![bookmark("Quick Fox", day(3)), bookmark("Lazy Dog", day(4))];

        let (ctx, _) = fx.context(day(5), items.clone());
        sync_at(&ctx, day(10)).unwrap();
        let before = fx.output_files();
        assert_eq!(before.len(), 2);

        // Same remote state: nothing to do.
        let (ctx, requests) = fx.context(day(5), items);
        let report = sync_at(&ctx, day(11)).unwrap();
        assert!(report.up_to_date);
        assert!(requests.borrow().is_empty());
        assert_eq!(fx.output_files(), before);
    }

    #[test]
    fn test_no_op_leaves_state_untouched() {
        let fx = Fixture::new(STATE);
        let before = fx.state_file();
        let (ctx, requests) = fx.context(day(1), vec![bookmark("Quick Fox", day(1))]);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert!(report.up_to_date);
        assert!(!report.state_saved);
        assert!(requests.borrow().is_empty());
        assert!(fx.output_files().is_empty());
        assert_eq!(fx.state_file(), before);
    }

    #[test]
    fn test_first_run_does_not_backfill() {
        let fx = Fixture::new("api_token = \"u:t\"\n");
        let (ctx, requests) = fx.context(day(5), vec![bookmark("Old One", day(2))]);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert!(report.up_to_date);
        assert!(requests.borrow().is_empty());
        assert!(fx.output_files().is_empty());
        // The first run's "now" becomes the start of the next window.
        assert_eq!(fx.last_import(), Some(day(10)));
    }

    #[test]
    fn test_first_run_fetches_only_from_now() {
        let fx = Fixture::new("api_token = \"u:t\"\n");
        let items = vec![bookmark("Old One", day(2)), bookmark("New One", day(11))];
        let (ctx, requests) = fx.context(day(12), items);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert_eq!(*requests.borrow(), vec![day(10)]);
        assert_eq!(report.written, 1);
        assert_eq!(fx.output_files(), vec!["new-one.md"]);
        assert_eq!(fx.last_import(), Some(day(12)));
    }

    #[test]
    fn test_debug_mode_changes_nothing_on_disk() {
        let mut fx = Fixture::new(STATE);
        fx.config.debug = true;
        let before = fx.state_file();
        let items = vec![bookmark("Quick Fox", day(3)), bookmark("Lazy Dog", day(4))];
        let (ctx, _) = fx.context(day(5), items);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert_eq!(report.dry_run, 2);
        assert_eq!(report.written, 0);
        assert!(!report.state_saved);
        assert!(fx.output_files().is_empty());
        assert_eq!(fx.state_file(), before);
    }

    #[test]
    fn test_debug_first_run_saves_nothing() {
        let mut fx = Fixture::new("api_token = \"u:t\"\n");
        fx.config.debug = true;
        let before = fx.state_file();
        let (ctx, _) = fx.context(day(5), Vec::new());

        sync_at(&ctx, day(10)).unwrap();
        assert_eq!(fx.state_file(), before);
    }

    #[test]
    fn test_existing_file_is_never_overwritten() {
        let fx = Fixture::new(STATE);
        fs::write(fx.out().join("quick-fox.md"), "mine").unwrap();
        let (ctx, _) = fx.context(day(5), vec![bookmark("The Quick Fox", day(3))]);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert_eq!(report.already_existed, 1);
        assert!(report.state_saved);
        assert_eq!(fs::read_to_string(fx.out().join("quick-fox.md")).unwrap(), "mine");
    }

    #[test]
    fn test_slug_collision_first_one_wins() {
        let fx = Fixture::new(STATE);
        let mut second = bookmark("Quick fox?", day(4));
        second.url = "https://example.org/other".into();
        let (ctx, _) = fx.context(day(5), vec![bookmark("Quick Fox", day(3)), second]);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.already_existed, 1);
        let content = fs::read_to_string(fx.out().join("quick-fox.md")).unwrap();
        assert!(content.contains("https://example.com/fox"));
    }

    #[test]
    fn test_render_failure_skips_item_and_holds_state() {
        let fx = Fixture::new(STATE);
        fs::write(
            &fx.config.template_path,
            "{% if toread %}{{ nothing.here }}{% endif %}{{ description }}\n",
        )
        .unwrap();
        let mut broken = bookmark("Broken One", day(4));
        broken.toread = true;
        let (ctx, _) = fx.context(day(5), vec![bookmark("Quick Fox", day(3)), broken]);

        let report = sync_at(&ctx, day(10)).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.state_saved);
        assert_eq!(fx.output_files(), vec!["quick-fox.md"]);
        assert_eq!(
            fs::read_to_string(fx.out().join("quick-fox.md")).unwrap(),
            "Quick Fox"
        );
        assert_eq!(fx.last_import(), Some(day(1)));
    }

    #[test]
    fn test_retry_after_failure_does_not_duplicate() {
        let fx = Fixture::new(STATE);
        fs::write(
            &fx.config.template_path,
            "{% if toread %}{{ nothing.here }}{% endif %}{{ description }}\n",
        )
        .unwrap();
        let mut broken = bookmark("Broken One", day(4));
        broken.toread = true;
        let items = vec![bookmark("Quick Fox", day(3)), broken];

        let (ctx, _) = fx.context(day(5), items.clone());
        sync_at(&ctx, day(10)).unwrap();

        // Template fixed; the whole delta comes again.
        fs::write(&fx.config.template_path, "{{ description }}\n").unwrap();
        let (ctx, requests) = fx.context(day(5), items);
        let report = sync_at(&ctx, day(11)).unwrap();

        assert_eq!(*requests.borrow(), vec![day(1)]);
        assert_eq!(report.written, 1);
        assert_eq!(report.already_existed, 1);
        assert_eq!(fx.output_files(), vec!["broken-one.md", "quick-fox.md"]);
        assert_eq!(fx.last_import(), Some(day(5)));
    }

    #[test]
    fn test_write_failure_holds_state() {
        let fx = Fixture::new(STATE);
        let items = vec![bookmark("Quick Fox", day(3)), bookmark("Lazy Dog", day(4))];
        let (ctx, _) = fx.context(day(5), items);
        // Output directory vanishes after the context was set up.
        fs::remove_dir(fx.out()).unwrap();

        let report = sync_at(&ctx, day(10)).unwrap();

        assert_eq!(report.fetched, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.written, 0);
        assert!(!report.state_saved);
        assert_eq!(fx.last_import(), Some(day(1)));
    }

    #[test]
    fn test_failed_state_save_keeps_documents() {
        let fx = Fixture::new(STATE);
        let (ctx, _) = fx.context(day(5), vec![bookmark("Quick Fox", day(3))]);
        // Put a non-empty directory where the state file lives.
        fs::remove_file(&fx.config.state_path).unwrap();
        fs::create_dir(&fx.config.state_path).unwrap();
        fs::write(fx.config.state_path.join("child"), "x").unwrap();

        let result = sync_at(&ctx, day(10));

        assert!(matches!(result, Err(PindownError::StateSave { .. })));
        assert_eq!(fx.output_files(), vec!["quick-fox.md"]);
    }

    #[test]
    fn test_unreadable_template_uses_builtin() {
        let mut fx = Fixture::new(STATE);
        fx.config.template_path = fx.dir.path().join("nowhere").join("template.md");
        let (ctx, _) = fx.context(day(5), vec![bookmark("Quick Fox", day(3))]);

        sync_at(&ctx, day(10)).unwrap();

        let content = fs::read_to_string(fx.out().join("quick-fox.md")).unwrap();
        assert!(content.contains("Status: draft"));
    }
}
