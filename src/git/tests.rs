use super::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// helper to initialise a test git repository
fn setup_test_repo() -> (TempDir, Repository) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();

    // configure git user for commits
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();
    config.set_bool("commit.gpgsign", false).unwrap();

    (temp_dir, repo)
}

/// helper to create a file with content
fn create_file(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

/// helper to stage a path via libgit2
fn stage_path(repo: &Repository, path: &str) {
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
}

/// helper to commit all changes
fn commit_all(repo: &Repository, message: &str) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature = repo.signature().unwrap();

    let parent_commit = repo.head().ok().and_then(|h| h.peel_to_commit().ok());

    if let Some(parent) = parent_commit {
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )
        .unwrap();
    } else {
        // first commit
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[])
            .unwrap();
    }
}

fn git_cli(path: &Path) -> GitCli {
    GitCli::new(path, Duration::from_secs(30))
}

/// the git binary is only needed by the mutation tests
fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

fn find<'a>(entries: &'a [StatusEntry], path: &str) -> &'a StatusEntry {
    entries
        .iter()
        .find(|entry| entry.path == path)
        .unwrap_or_else(|| panic!("{path} missing from {entries:?}"))
}

#[test]
fn test_status_markers() {
    assert_eq!(status_markers(Status::CURRENT), None);
    assert_eq!(status_markers(Status::IGNORED), None);
    assert_eq!(status_markers(Status::WT_NEW), Some(('?', '?')));
    assert_eq!(status_markers(Status::INDEX_NEW), Some(('A', ' ')));
    assert_eq!(
        status_markers(Status::INDEX_MODIFIED | Status::WT_MODIFIED),
        Some(('M', 'M'))
    );
    assert_eq!(status_markers(Status::WT_DELETED), Some((' ', 'D')));
    assert_eq!(status_markers(Status::CONFLICTED), Some(('U', 'U')));
}

#[test]
fn test_status_clean_repo() {
    let (temp_dir, repo) = setup_test_repo();
    create_file(&temp_dir.path().join("a.txt"), "a");
    commit_all(&repo, "initial commit");

    let entries = git_cli(temp_dir.path()).status().unwrap();
    assert!(entries.is_empty(), "unexpected entries: {entries:?}");
}

#[test]
fn test_status_staged_unstaged_and_untracked() {
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("a.txt"), "a");
    create_file(&repo_path.join("b.txt"), "b");
    commit_all(&repo, "initial commit");

    // a.txt staged, b.txt modified in the working tree only, c.txt untracked
    create_file(&repo_path.join("a.txt"), "a changed");
    stage_path(&repo, "a.txt");
    create_file(&repo_path.join("b.txt"), "b changed");
    create_file(&repo_path.join("c.txt"), "c");

    let entries = git_cli(repo_path).status().unwrap();

    assert_eq!(find(&entries, "a.txt"), &StatusEntry::new("a.txt", 'M', ' '));
    assert_eq!(find(&entries, "b.txt"), &StatusEntry::new("b.txt", ' ', 'M'));
    assert_eq!(find(&entries, "c.txt"), &StatusEntry::new("c.txt", '?', '?'));
}

#[test]
fn test_status_partially_staged() {
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("file.txt"), "one");
    commit_all(&repo, "initial commit");

    create_file(&repo_path.join("file.txt"), "two");
    stage_path(&repo, "file.txt");
    create_file(&repo_path.join("file.txt"), "three");

    let entries = git_cli(repo_path).status().unwrap();
    assert_eq!(entries, vec![StatusEntry::new("file.txt", 'M', 'M')]);
}

#[test]
fn test_status_untracked_directory_is_recursed() {
    let (temp_dir, _repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    fs::create_dir(repo_path.join("subdir")).unwrap();
    create_file(&repo_path.join("subdir/file.txt"), "content");

    let entries = git_cli(repo_path).status().unwrap();
    assert_eq!(
        entries,
        vec![StatusEntry::new("subdir/file.txt", '?', '?')]
    );
}

#[test]
fn test_status_outside_repository_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(git_cli(temp_dir.path()).status().is_err());
}

#[test]
fn test_sanity_check_returns_workdir() {
    let (temp_dir, _repo) = setup_test_repo();
    fs::create_dir(temp_dir.path().join("nested")).unwrap();

    let root = sanity_check(&temp_dir.path().join("nested")).unwrap();
    assert_eq!(
        root.canonicalize().unwrap(),
        temp_dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_sanity_check_rejects_bare_repository() {
    let temp_dir = TempDir::new().unwrap();
    Repository::init_bare(temp_dir.path()).unwrap();

    assert!(sanity_check(temp_dir.path()).is_err());
}

#[test]
fn test_add_and_reset() {
    if !git_available() {
        return;
    }
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("a.txt"), "a");
    commit_all(&repo, "initial commit");
    create_file(&repo_path.join("a.txt"), "a changed");

    let git = git_cli(repo_path);

    git.add(&repo_path.join("a.txt")).unwrap();
    assert_eq!(
        git.status().unwrap(),
        vec![StatusEntry::new("a.txt", 'M', ' ')]
    );

    git.reset(&repo_path.join("a.txt")).unwrap();
    assert_eq!(
        git.status().unwrap(),
        vec![StatusEntry::new("a.txt", ' ', 'M')]
    );
}

#[test]
fn test_add_deleted_file_stages_deletion() {
    if !git_available() {
        return;
    }
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("gone.txt"), "soon gone");
    commit_all(&repo, "initial commit");
    fs::remove_file(repo_path.join("gone.txt")).unwrap();

    let git = git_cli(repo_path);
    git.add(&repo_path.join("gone.txt")).unwrap();

    assert_eq!(
        git.status().unwrap(),
        vec![StatusEntry::new("gone.txt", 'D', ' ')]
    );
}

#[test]
fn test_add_unknown_path_reports_stderr() {
    if !git_available() {
        return;
    }
    let (temp_dir, _repo) = setup_test_repo();

    let error = git_cli(temp_dir.path())
        .add(&temp_dir.path().join("no-such-file.txt"))
        .unwrap_err();
    assert!(error.to_string().starts_with("git add failed"), "{error}");
}

#[test]
fn test_staged_diff_and_commit() {
    if !git_available() {
        return;
    }
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("a.txt"), "first\n");
    commit_all(&repo, "initial commit");
    create_file(&repo_path.join("a.txt"), "second\n");
    stage_path(&repo, "a.txt");

    let git = git_cli(repo_path);
    let diff = git.staged_diff().unwrap();
    assert!(diff.contains("-first"), "{diff}");
    assert!(diff.contains("+second"), "{diff}");

    git.commit("update a\n").unwrap();

    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.summary(), Some("update a"));
    assert!(git.status().unwrap().is_empty());
}

#[test]
fn test_text_output_ignores_forced_color() {
    if !git_available() {
        return;
    }
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();
    {
        let mut config = repo.config().unwrap();
        config.set_str("color.ui", "always").unwrap();
        config.set_str("color.status", "always").unwrap();
        config.set_str("color.diff", "always").unwrap();
    }

    create_file(&repo_path.join("a.txt"), "first\n");
    commit_all(&repo, "initial commit");
    create_file(&repo_path.join("a.txt"), "second\n");
    stage_path(&repo, "a.txt");
    create_file(&repo_path.join("b.txt"), "untracked\n");

    let git = git_cli(repo_path);
    let status = git.status_text().unwrap();
    assert!(status.contains("a.txt"), "{status}");
    assert!(!status.contains('\x1b'), "{status:?}");

    let diff = git.staged_diff().unwrap();
    assert!(diff.contains("+second"), "{diff}");
    assert!(!diff.contains('\x1b'), "{diff:?}");
}

#[test]
fn test_subcommand_name_skips_config_overrides() {
    let args: Vec<OsString> = ["-c", "color.status=never", "status"]
        .into_iter()
        .map(OsString::from)
        .collect();
    assert_eq!(subcommand_name(&args), "status");
    assert_eq!(subcommand_name(&[]), "");
}
