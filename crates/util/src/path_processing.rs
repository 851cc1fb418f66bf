use std::path::PathBuf;

use dirs_next::home_dir;

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// Pick a path under `dir` for `file_name` that does not exist yet by
/// appending ` (1)`, ` (2)`, ... before the extension.
pub fn unique_destination(dir: &std::path::Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (file_name, None),
    };
    (1..)
        .map(|n| match extension {
            Some(extension) => dir.join(format!("{stem} ({n}).{extension}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// File name to save a download under: the supplied name when it is a plain
/// file name, otherwise the last URL path segment, otherwise `download`.
pub fn download_file_name(file_name: Option<&str>, url: &str) -> String {
    let sanitize = |name: &str| {
        let name = name.trim();
        (!name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..").then(|| name.to_string())
    };
    file_name
        .and_then(sanitize)
        .or_else(|| {
            let path = url.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next().and_then(sanitize)
        })
        .unwrap_or_else(|| "download".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
        assert_eq!(expand_tilde("~/x/config.json"), home.join("x/config.json"));
        assert_eq!(expand_tilde(" /etc/hookflow.json "), PathBuf::from("/etc/hookflow.json"));
    }

    #[test]
    fn destinations_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_destination(dir.path(), "report.pdf"), dir.path().join("report.pdf"));

        std::fs::write(dir.path().join("report.pdf"), b"1").unwrap();
        std::fs::write(dir.path().join("report (1).pdf"), b"2").unwrap();
        assert_eq!(unique_destination(dir.path(), "report.pdf"), dir.path().join("report (2).pdf"));
    }

    #[test]
    fn download_names_prefer_supplied_name() {
        assert_eq!(download_file_name(Some("report.pdf"), "/files/abc"), "report.pdf");
        assert_eq!(download_file_name(Some("../etc/passwd"), "/files/abc.csv?x=1"), "abc.csv");
        assert_eq!(download_file_name(None, "https://host/"), "download");
    }
}
