//! Canvas directory discovery and the list of drafts offered by the file
//! selector.
//!
//! Drafts live in `<canvas>/drafts`. Only `.md` and `.txt` files are
//! listed, most recently modified first.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Interval between directory rescans.
pub const RESCAN_INTERVAL: Duration = Duration::from_secs(2);

const DRAFTS_DIR: &str = "drafts";

/// Canvas directory looked up from the working directory by default.
pub const DEFAULT_CANVAS_DIR: &str = ".claude/canvas";

/// File shown when there are no drafts.
pub const CONTENT_FILE: &str = "content.md";

/// One selectable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// The drafts directory for a canvas directory.
pub fn drafts_dir(canvas_dir: &Path) -> PathBuf {
    canvas_dir.join(DRAFTS_DIR)
}

/// Create the drafts directory if it is missing.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_drafts_dir(canvas_dir: &Path) -> io::Result<PathBuf> {
    let dir = drafts_dir(canvas_dir);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Find `relative` under `start` or the nearest ancestor that has it.
///
/// An absolute `relative` is returned as is when it exists.
pub fn find_canvas_dir(start: &Path, relative: &Path) -> Option<PathBuf> {
    if relative.is_absolute() {
        return relative.is_dir().then(|| relative.to_path_buf());
    }
    start
        .ancestors()
        .map(|dir| dir.join(relative))
        .find(|candidate| candidate.is_dir())
}

/// The file to open first: `explicit`, else the newest draft, else the
/// canvas `content.md`.
pub fn initial_file(canvas_dir: &Path, explicit: Option<&Path>, drafts: &[FileEntry]) -> PathBuf {
    explicit.map_or_else(
        || {
            drafts
                .first()
                .map_or_else(|| canvas_dir.join(CONTENT_FILE), |entry| entry.path.clone())
        },
        Path::to_path_buf,
    )
}

/// List `.md` and `.txt` files in `dir`, newest first.
///
/// Ties on modification time are broken by name so the order is stable.
///
/// # Errors
/// Returns an error if `dir` cannot be read. Entries that vanish or cannot
/// be stat'ed while scanning are skipped.
pub fn scan_files(dir: &Path) -> io::Result<Vec<FileEntry>> {
    let mut files: Vec<FileEntry> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_listed_ext(&name) {
                return None;
            }
            Some(FileEntry {
                name,
                path: entry.path(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
        .collect();
    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(files)
}

fn is_listed_ext(name: &str) -> bool {
    Path::new(name).extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("txt")
    })
}

/// Shorten `name` to `max` characters, keeping the extension when there is
/// room for it.
///
/// ```
/// use canvas_tui::files::truncate_filename;
///
/// assert_eq!(truncate_filename("short.md", 20), "short.md");
/// assert_eq!(truncate_filename("a-very-long-draft-name.md", 20), "a-very-long-dr....md");
/// ```
pub fn truncate_filename(name: &str, max: usize) -> String {
    let len = name.chars().count();
    if len <= max {
        return name.to_string();
    }

    let ext = Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let ext_len = ext.chars().count();
    let stem_room = max.saturating_sub(ext_len + 3);

    if stem_room == 0 {
        let head: String = name.chars().take(max.saturating_sub(3)).collect();
        return format!("{head}...");
    }
    let stem: String = name.chars().take(stem_room).collect();
    format!("{stem}...{ext}")
}

/// Compact age of a modification time: `now`, `5m`, `3h`, `2d`, `1mo`.
pub fn format_relative_time(modified: SystemTime, now: SystemTime) -> String {
    let seconds = now.duration_since(modified).map_or(0, |age| age.as_secs());
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m")
    } else if hours < 24 {
        format!("{hours}h")
    } else if days < 30 {
        format!("{days}d")
    } else {
        format!("{}mo", days / 30)
    }
}

/// Fires once every `interval`.
#[derive(Debug, Clone)]
pub struct RescanTimer {
    interval: Duration,
    last: Instant,
}

impl RescanTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// Returns true and restarts the timer when the interval has elapsed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Time left until the next rescan.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last))
    }
}

impl Default for RescanTimer {
    fn default() -> Self {
        Self::new(RESCAN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path, modified: SystemTime) {
        let file = File::create(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn test_scan_lists_drafts_newest_first() {
        let dir = tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(&dir.path().join("old.md"), base);
        touch(&dir.path().join("new.txt"), base + Duration::from_secs(60));
        touch(&dir.path().join("mid.MD"), base + Duration::from_secs(30));
        touch(&dir.path().join("image.png"), base + Duration::from_secs(90));
        std::fs::create_dir(dir.path().join("nested.md")).unwrap();

        let names: Vec<_> = scan_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["new.txt", "mid.MD", "old.md"]);
    }

    #[test]
    fn test_scan_missing_dir_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(scan_files(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_ensure_drafts_dir_creates_it() {
        let dir = tempdir().unwrap();
        let drafts = ensure_drafts_dir(dir.path()).unwrap();
        assert!(drafts.is_dir());
        assert_eq!(drafts, dir.path().join("drafts"));
    }

    #[test]
    fn test_truncate_keeps_extension() {
        assert_eq!(truncate_filename("exactly-twenty-ch.md", 20), "exactly-twenty-ch.md");
        assert_eq!(
            truncate_filename("quarterly-report-draft.md", 20),
            "quarterly-repo....md"
        );
        assert_eq!(truncate_filename("quarterly-report-draft.md", 20).chars().count(), 20);
    }

    #[test]
    fn test_truncate_without_room_for_extension() {
        assert_eq!(truncate_filename("abcdefgh.markdown", 8), "abcde...");
        assert_eq!(truncate_filename("abcdefghijk", 6), "abc...");
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100_000_000);
        let ago = |secs| now - Duration::from_secs(secs);
        assert_eq!(format_relative_time(ago(5), now), "now");
        assert_eq!(format_relative_time(ago(5 * 60), now), "5m");
        assert_eq!(format_relative_time(ago(3 * 3600), now), "3h");
        assert_eq!(format_relative_time(ago(2 * 86_400), now), "2d");
        assert_eq!(format_relative_time(ago(65 * 86_400), now), "2mo");
        assert_eq!(format_relative_time(now + Duration::from_secs(10), now), "now");
    }

    #[test]
    fn test_find_canvas_dir_walks_up() {
        let root = tempdir().unwrap();
        let canvas = root.path().join(".claude").join("canvas");
        std::fs::create_dir_all(&canvas).unwrap();
        let nested = root.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_canvas_dir(&nested, Path::new(DEFAULT_CANVAS_DIR)).unwrap();
        assert_eq!(found, canvas);
    }

    #[test]
    fn test_find_canvas_dir_missing() {
        let root = tempdir().unwrap();
        assert!(find_canvas_dir(root.path(), Path::new("no-such-canvas-dir-here")).is_none());
    }

    #[test]
    fn test_find_canvas_dir_absolute() {
        let root = tempdir().unwrap();
        assert_eq!(
            find_canvas_dir(Path::new("/"), root.path()),
            Some(root.path().to_path_buf())
        );
    }

    #[test]
    fn test_initial_file_preference() {
        let canvas = Path::new("/canvas");
        let drafts = vec![FileEntry {
            name: "newest.md".to_string(),
            path: PathBuf::from("/canvas/drafts/newest.md"),
            modified: SystemTime::now(),
        }];

        let explicit = Path::new("/tmp/mine.md");
        assert_eq!(initial_file(canvas, Some(explicit), &drafts), explicit);
        assert_eq!(
            initial_file(canvas, None, &drafts),
            PathBuf::from("/canvas/drafts/newest.md")
        );
        assert_eq!(initial_file(canvas, None, &[]), canvas.join(CONTENT_FILE));
    }

    #[test]
    fn test_rescan_timer() {
        let mut timer = RescanTimer::new(Duration::from_millis(100));
        let start = Instant::now();
        assert!(!timer.take_due(start));
        let later = start + Duration::from_millis(150);
        assert!(timer.take_due(later));
        assert!(!timer.take_due(later + Duration::from_millis(10)));
        assert_eq!(timer.remaining(later), Duration::from_millis(100));
    }
}
