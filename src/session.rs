//! Session state - persist last answers and scored runs to .enervi-session.json

use crate::{RawAnswers, ScoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_FILENAME: &str = ".enervi-session.json";
const MAX_RUNS: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Most recent answers, reused by `--resume`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_answers: Option<RawAnswers>,
    #[serde(default)]
    pub runs: Vec<SessionRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRun {
    pub timestamp: String,
    pub penalty: bool,
    pub result: ScoreResult,
}

impl Session {
    /// Result of the latest stored run
    pub fn previous_result(&self) -> Option<&ScoreResult> {
        self.runs.last().map(|r| &r.result)
    }

    /// Record a scored run and remember its answers
    pub fn record(&mut self, answers: RawAnswers, penalty: bool, result: ScoreResult) {
        self.last_answers = Some(answers);
        self.runs.push(SessionRun {
            timestamp: chrono::Utc::now().to_rfc3339(),
            penalty,
            result,
        });
        if self.runs.len() > MAX_RUNS {
            self.runs.drain(0..self.runs.len() - MAX_RUNS);
        }
    }
}

/// Directory holding the session: nearest ancestor with a session file,
/// config file or `.git`
pub fn find_session_root(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?
    } else {
        start
    };

    loop {
        if dir.join(SESSION_FILENAME).exists()
            || dir.join(crate::config::CONFIG_FILENAME).exists()
            || dir.join(".git").exists()
        {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// Load session from root (or create empty)
pub fn load_session(root: &Path) -> Session {
    let path = root.join(SESSION_FILENAME);
    if let Ok(content) = fs::read_to_string(&path) {
        match serde_json::from_str::<Session>(&content) {
            Ok(session) => {
                log::debug!(
                    "loaded session from {} ({} runs)",
                    path.display(),
                    session.runs.len()
                );
                return session;
            }
            Err(e) => log::debug!("ignoring unreadable session {}: {}", path.display(), e),
        }
    }
    Session::default()
}

/// Save session to root
pub fn save_session(root: &Path, session: &Session) -> std::io::Result<()> {
    let path = root.join(SESSION_FILENAME);
    let content = serde_json::to_string_pretty(session).unwrap_or_else(|_| "{}".to_string());
    log::debug!("saving session to {}", path.display());
    fs::write(path, content)
}

/// Format delta for console: " [was 50.0, down 4.0]", " [was 50.0, up 2.5]",
/// " [unchanged]" or ""
pub fn format_delta(previous: Option<f64>, current: f64) -> String {
    let Some(prev) = previous else {
        return String::new();
    };
    let diff = crate::aggregator::scoring::round1(current - prev);
    if diff == 0.0 {
        return " [unchanged]".to_string();
    }
    if diff > 0.0 {
        format!(" [was {:.1}, up {:.1}]", prev, diff)
    } else {
        format!(" [was {:.1}, down {:.1}]", prev, -diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute, AggregationConfig};

    fn result_for(value: f64) -> ScoreResult {
        compute(&RawAnswers::uniform(value), &AggregationConfig::default())
    }

    // --- format_delta ---

    #[test]
    fn format_delta_no_previous_returns_empty() {
        assert_eq!(format_delta(None, 85.0), "");
    }

    #[test]
    fn format_delta_score_increased() {
        assert_eq!(format_delta(Some(50.0), 53.0), " [was 50.0, up 3.0]");
    }

    #[test]
    fn format_delta_score_decreased() {
        assert_eq!(format_delta(Some(50.0), 47.5), " [was 50.0, down 2.5]");
    }

    #[test]
    fn format_delta_score_unchanged() {
        assert_eq!(format_delta(Some(75.0), 75.0), " [unchanged]");
    }

    #[test]
    fn format_delta_ignores_float_noise() {
        assert_eq!(format_delta(Some(0.3), 0.1 + 0.2), " [unchanged]");
    }

    // --- record ---

    #[test]
    fn record_remembers_answers_and_result() {
        let mut session = Session::default();
        session.record(RawAnswers::uniform(5.0), false, result_for(5.0));

        assert_eq!(session.last_answers, Some(RawAnswers::uniform(5.0)));
        assert_eq!(session.runs.len(), 1);
        assert!(!session.runs[0].penalty);
        assert_eq!(session.previous_result(), Some(&result_for(5.0)));
    }

    #[test]
    fn previous_result_uses_last_run() {
        let mut session = Session::default();
        session.record(RawAnswers::uniform(3.0), false, result_for(3.0));
        session.record(RawAnswers::uniform(7.0), true, result_for(7.0));

        let prev = session.previous_result().unwrap();
        assert_eq!(prev.stage("S1"), Some(70.0));
    }

    #[test]
    fn record_truncates_to_max_runs() {
        let mut session = Session::default();
        for _ in 0..55 {
            session.record(RawAnswers::uniform(5.0), false, result_for(5.0));
        }
        assert_eq!(session.runs.len(), MAX_RUNS);
    }

    // --- load_session / save_session ---

    #[test]
    fn save_and_load_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();
        let answers = RawAnswers::uniform(5.0).with_stage(2, 9.0);
        session.record(answers, true, result_for(5.0));

        save_session(dir.path(), &session).unwrap();
        let loaded = load_session(dir.path());

        assert_eq!(loaded.last_answers, Some(answers));
        assert_eq!(loaded.runs.len(), 1);
        assert!(loaded.runs[0].penalty);
        assert_eq!(loaded.runs[0].result.dominant_stage, "S1");
    }

    #[test]
    fn load_session_returns_empty_for_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = load_session(dir.path());
        assert!(session.runs.is_empty());
        assert!(session.last_answers.is_none());
    }

    #[test]
    fn load_session_returns_empty_for_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILENAME), "not valid json {{{").unwrap();
        let session = load_session(dir.path());
        assert!(session.runs.is_empty());
    }

    // --- find_session_root ---

    #[test]
    fn find_session_root_with_session_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILENAME), "{}").unwrap();
        let root = find_session_root(dir.path());
        assert_eq!(root.unwrap(), dir.path());
    }

    #[test]
    fn find_session_root_with_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::config::CONFIG_FILENAME), "{}").unwrap();
        let sub = dir.path().join("answers");
        std::fs::create_dir(&sub).unwrap();
        let root = find_session_root(&sub);
        assert_eq!(root.unwrap(), dir.path());
    }
}
