use jobscout_config::{TaskKind, TaskSpec};

/// Search boards, then apply.
pub const GROUND_TASK: &str = "You are a professional job researcher.
1. Review my resume with read_cv.
2. Help me search for available junior python developer and data analyst jobs, or any positions that would fit my resume, by looking at LinkedIn, Indeed and other relevant sites. Save every relevant listing with save_jobs.
3. Start applying to all jobs found and do not stop until you cannot find any more suitable jobs.
NEVER click element index 0.
If you cannot find job listings or next/submit application buttons:
   - Use find_elements_with_scroll to look for job listings
   - Use scroll_page to navigate through the page
Go to:";

/// Work through the jobs already saved.
pub const APPLY_TASK: &str = "You are a professional job researcher.
1. Read my resume with read_cv.
2. Read the saved jobs file with read_jobs.
3. Start applying to the links.
You can and should navigate through pages, e.g. by scrolling.";

/// Prompt text for one configured agent.
pub fn build_task(spec: &TaskSpec) -> String {
    let base = match spec.kind {
        TaskKind::Ground => GROUND_TASK,
        TaskKind::Apply => APPLY_TASK,
    };
    match spec.target.as_deref().map(str::trim) {
        Some(target) if !target.is_empty() => format!("{base}\n{target}"),
        _ => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_appended_on_its_own_line() {
        let task = build_task(&TaskSpec {
            kind: TaskKind::Ground,
            target: Some("https://www.indeed.com/".into()),
        });
        assert!(task.starts_with(GROUND_TASK));
        assert!(task.ends_with("Go to:\nhttps://www.indeed.com/"));
    }

    #[test]
    fn blank_target_is_ignored() {
        let task = build_task(&TaskSpec {
            kind: TaskKind::Apply,
            target: Some("  ".into()),
        });
        assert_eq!(task, APPLY_TASK);
    }
}
