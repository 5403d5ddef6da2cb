use std::io::Write;
use std::path::PathBuf;

use clap::CommandFactory;

use crate::Cli;

const BIN_NAME: &str = "orgmirror";

fn completion_script(shell: clap_complete::Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut out = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut out);
    out
}

fn main_man_page() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    clap_mangen::Man::new(Cli::command()).render(&mut out)?;
    Ok(out)
}

fn write_stdout(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()
}

pub(crate) fn handle_completions(
    shell: clap_complete::Shell,
) -> Result<(), Box<dyn std::error::Error>> {
    write_stdout(&completion_script(shell))?;
    Ok(())
}

/// Print the main page, or write one page per subcommand into `output`.
pub(crate) fn handle_man(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(dir) = output else {
        write_stdout(&main_man_page()?)?;
        return Ok(());
    };

    std::fs::create_dir_all(&dir)?;
    clap_mangen::generate_to(Cli::command(), &dir)?;
    println!("Generated man pages in: {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    #[test]
    fn completion_script_mentions_subcommands() {
        let script = completion_script(clap_complete::Shell::Bash);
        let script = String::from_utf8(script).expect("completion output should be UTF-8");
        assert!(script.contains(BIN_NAME));
        assert!(script.contains("sync"));
        assert!(script.contains("migrate"));
    }

    #[test]
    fn main_man_page_contains_expected_title() {
        let page = main_man_page().expect("man rendering should succeed");
        let page = String::from_utf8(page).expect("man output should be UTF-8");
        assert!(page.to_lowercase().contains(".th orgmirror"));
    }

    #[test]
    fn man_pages_are_written_per_subcommand() {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("orgmirror-man-test-{nonce}"));

        handle_man(Some(dir.clone())).expect("man page generation should succeed");

        let names: Vec<_> = std::fs::read_dir(&dir)
            .expect("output directory should exist")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n == "orgmirror.1"));
        assert!(names.iter().any(|n| n == "orgmirror-sync.1"));

        std::fs::remove_dir_all(&dir).expect("test output directory should be removable");
    }
}
